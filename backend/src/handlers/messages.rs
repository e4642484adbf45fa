use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use vogaflex_shared::{MessageRow, MessagesResponse};

use crate::error::{ApiResult, AppError};
use crate::pagination::{PaginationParams, MESSAGES_PAGE_SIZE};
use crate::reporting::dedup::{dedup_thread, UnifiedMessage};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub chat_id: Option<String>,
}

/// Deduplicated thread of one chat, oldest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(chat): Query<ChatQuery>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Json<MessagesResponse>> {
    let chat_id = chat
        .chat_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::BadRequest("chat_id_required"))?;
    let window = page.window(MESSAGES_PAGE_SIZE)?;

    let rows = state.store.chat_messages(&chat_id).await?;
    let thread = dedup_thread(rows.into_iter().map(UnifiedMessage::from).collect());
    tracing::debug!(chat_id = %chat_id, "Thread has {} messages", thread.len());

    Ok(Json(MessagesResponse {
        messages: window
            .apply(thread)
            .into_iter()
            .map(MessageRow::from)
            .collect(),
    }))
}
