use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub mod conversations;
pub mod dashboard;
pub mod events;
pub mod messages;

/// Reporting endpoints. The dashboard frontend calls them with a trailing
/// slash, other clients without.
pub fn report_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", get(events::list_events))
        .route("/api/events/", get(events::list_events))
        .route("/api/conversations", get(conversations::list_conversations))
        .route("/api/conversations/", get(conversations::list_conversations))
        .route("/api/messages", get(messages::list_messages))
        .route("/api/messages/", get(messages::list_messages))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/dashboard/", get(dashboard::dashboard))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    if state.store.ping().await {
        (
            StatusCode::OK,
            Json(json!({"status": "healthy", "service": "vogaflex-reports", "database": "connected"})),
        )
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unhealthy", "service": "vogaflex-reports", "database": "unreachable"})),
        )
    }
}
