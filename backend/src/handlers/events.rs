use axum::{extract::State, response::Json};
use std::sync::Arc;
use vogaflex_shared::{EventRow, EventsResponse};

use crate::error::ApiResult;
use crate::AppState;

/// Most events returned by `/api/events/`.
pub const EVENTS_LIMIT: i64 = 5000;

/// Newest raw ingestion events.
pub async fn list_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<EventsResponse>> {
    let events: Vec<EventRow> = state
        .store
        .recent_events(EVENTS_LIMIT)
        .await?
        .into_iter()
        .map(EventRow::from)
        .collect();

    tracing::debug!("Returning {} raw events", events.len());
    Ok(Json(EventsResponse { events }))
}
