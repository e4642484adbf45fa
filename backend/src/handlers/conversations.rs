use axum::{
    extract::{Query, State},
    response::Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use vogaflex_shared::{ConversationRow, ConversationsResponse};

use crate::error::ApiResult;
use crate::pagination::{PaginationParams, CONVERSATIONS_PAGE_SIZE};
use crate::reporting::dedup::{latest_by_chat, UnifiedMessage};
use crate::reporting::filters::ConversationFilters;
use crate::reporting::reconcile::{reconcile, Conversation};
use crate::reporting::stages::conversation_status;
use crate::AppState;

/// Reconciled conversations, most recently active first. The database picks
/// the page; only the chats on it are read and merged.
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PaginationParams>,
    Query(filters): Query<ConversationFilters>,
) -> ApiResult<Json<ConversationsResponse>> {
    let window = page.window(CONVERSATIONS_PAGE_SIZE)?;
    let filters = filters.validated()?;

    let chat_ids = state.store.conversation_page(&filters, window).await?;
    if chat_ids.is_empty() {
        return Ok(Json(ConversationsResponse::default()));
    }

    let mut conversations: HashMap<String, Conversation> =
        reconcile(state.store.conversation_sources(&chat_ids).await?)
            .into_iter()
            .map(|c| (c.chat_id.clone(), c))
            .collect();
    let mut latest = latest_by_chat(
        state
            .store
            .latest_messages(&chat_ids)
            .await?
            .into_iter()
            .map(UnifiedMessage::from)
            .collect(),
    );

    // page order comes from the database
    let rows: Vec<ConversationRow> = chat_ids
        .iter()
        .filter_map(|chat_id| conversations.remove(chat_id))
        .map(|c| {
            let last = latest.remove(&c.chat_id);
            conversation_row(c, last)
        })
        .collect();

    tracing::debug!("Listing {} conversations", rows.len());
    Ok(Json(ConversationsResponse { conversations: rows }))
}

fn conversation_row(c: Conversation, last: Option<UnifiedMessage>) -> ConversationRow {
    let status_normalizado = conversation_status(
        c.status_conversa.as_deref(),
        c.etapa_funil.as_deref(),
        c.coluna_kanban.as_deref(),
    )
    .map(|stage| stage.label().to_string());

    let (msg_tipo, msg_conteudo, msg_status_envio, evento_timestamp, msg_from_client) = match last {
        Some(m) => (m.msg_tipo, m.msg_conteudo, m.status_envio, m.timestamp, m.from_client),
        None => (None, None, None, None, None),
    };

    ConversationRow {
        chat_id: c.chat_id,
        protocolo: c.protocolo,
        cliente_nome: c.cliente_nome,
        cliente_telefone: c.cliente_telefone,
        vendedor_nome: c.vendedor_nome,
        vendedor_email: c.vendedor_email,
        status_conversa: c.status_conversa,
        status_normalizado,
        etapa_funil: c.etapa_funil,
        departamento: c.departamento,
        coluna_kanban: c.coluna_kanban,
        data_criacao_chat: c.data_criacao_chat,
        data_fechamento: c.data_fechamento,
        valor_orcamento: c.valor_orcamento,
        motivo_perda: c.motivo_perda,
        produto_interesse: c.produto_interesse,
        ai_agent_rating: c.ai_agent_rating,
        ai_customer_sentiment: c.ai_customer_sentiment,
        ai_summary: c.ai_summary,
        ai_suggestion: c.ai_suggestion,
        contact_reason: c.contact_reason,
        updated_at: c.updated_at,
        created_at: c.created_at,
        msg_tipo,
        msg_conteudo,
        msg_status_envio,
        evento_timestamp,
        msg_from_client,
    }
}
