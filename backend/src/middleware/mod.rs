pub mod observability;

pub use observability::trace_layer;
