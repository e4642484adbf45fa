use axum::{
    extract::{Query, State},
    response::Json,
};
use std::sync::Arc;
use vogaflex_shared::DashboardResponse;

use crate::error::ApiResult;
use crate::reporting::dashboard::build_dashboard;
use crate::reporting::filters::ConversationFilters;
use crate::AppState;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ConversationFilters>,
) -> ApiResult<Json<DashboardResponse>> {
    let filters = filters.validated()?;

    let conversations = state.store.dashboard_conversations(&filters).await?;
    let chat_ids: Vec<String> = conversations.iter().map(|c| c.chat_id.clone()).collect();
    let messages = state.store.dashboard_messages(&chat_ids).await?;

    tracing::debug!(
        "Dashboard over {} conversations and {} messages",
        conversations.len(),
        messages.len()
    );
    Ok(Json(build_dashboard(&conversations, messages, &state.rules)))
}
