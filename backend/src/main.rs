use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod pagination;
mod reporting;
mod store;

pub use error::{ApiResult, AppError};


use reporting::ReportRules;
use store::{PgReportStore, ReportStore};

pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub rules: ReportRules,
}

/// Router with every endpoint and layer, ready to be served.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Vogaflex reporting API" }))
        .route("/health", get(handlers::health_check))
        .merge(handlers::report_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::trace_layer())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url).await?;

    let store = PgReportStore::new(db_pool, config.business_hours.timezone);
    let app_state = Arc::new(AppState {
        store: Arc::new(store),
        rules: ReportRules::new(config.business_hours),
    });

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!(
        "Server running on {} (reports in {})",
        config.server_addr,
        config.business_hours.timezone
    );

    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
