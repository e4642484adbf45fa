//! Reporting rules.
//!
//! Everything here is pure: rows come in from the store, response models go
//! out. None of it touches the database.

pub mod budget;
pub mod business_hours;
pub mod classify;
pub mod dashboard;
pub mod dedup;
pub mod direction;
pub mod filters;
pub mod handoff;
pub mod reconcile;
pub mod stages;

pub use business_hours::BusinessHours;
pub use handoff::{Handoff, HandoffRules};

/// Rule set shared by every request.
#[derive(Debug, Clone, Default)]
pub struct ReportRules {
    pub business_hours: BusinessHours,
    pub handoff: HandoffRules,
}

impl ReportRules {
    pub fn new(business_hours: BusinessHours) -> Self {
        Self {
            business_hours,
            handoff: HandoffRules::default(),
        }
    }
}
