//! Read access to the reporting tables.
//!
//! Handlers only see [`ReportStore`]; the PostgreSQL implementation lives in
//! [`postgres`] and tests substitute the generated mock.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::FromRow;
use vogaflex_shared::EventRow;

use crate::reporting::direction::{delivery_status, RAW_EVENT_DIRECTIONS};
use crate::pagination::Window;
use crate::reporting::filters::ConversationFilters;

pub use postgres::PgReportStore;

/// Row of `smclick_raw_events` as selected; direction and delivery status are
/// derived when converting to [`EventRow`].
#[derive(Debug, Clone, Default, FromRow)]
pub struct RawEvent {
    pub id: Option<Value>,
    pub chat_id: Option<String>,
    pub protocolo: Option<String>,
    pub data_criacao_chat: Option<DateTime<Utc>>,
    pub status_conversa: Option<String>,
    pub tipo_fluxo: Option<String>,
    pub cliente_id_crm: Option<String>,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
    pub vendedor_id: Option<String>,
    pub vendedor_nome: Option<String>,
    pub vendedor_email: Option<String>,
    pub departamento: Option<String>,
    pub coluna_kanban: Option<String>,
    pub instancia_id: Option<String>,
    pub instancia_nome: Option<String>,
    pub instancia_telefone: Option<String>,
    pub instancia_tipo: Option<String>,
    pub valor_orcamento: Option<Decimal>,
    pub etapa_funil: Option<String>,
    pub produto_interesse: Option<String>,
    pub motivo_perda: Option<String>,
    pub data_fechamento: Option<DateTime<Utc>>,
    pub acessorios: Option<String>,
    pub msg_direcao: Option<String>,
    pub msg_tipo: Option<String>,
    pub msg_conteudo: Option<String>,
    pub msg_delivered: Option<bool>,
    pub msg_erro_motivo: Option<String>,
    /// Event time, falling back to chat creation and ingestion time.
    pub evento_timestamp: Option<DateTime<Utc>>,
    pub ingested_at: Option<DateTime<Utc>>,
}

impl From<RawEvent> for EventRow {
    fn from(raw: RawEvent) -> Self {
        Self {
            msg_from_client: RAW_EVENT_DIRECTIONS.from_client(raw.msg_direcao.as_deref()),
            msg_status_envio: delivery_status(raw.msg_delivered, raw.msg_erro_motivo.as_deref()),
            id: raw.id,
            chat_id: raw.chat_id,
            protocolo: raw.protocolo,
            data_criacao_chat: raw.data_criacao_chat,
            status_conversa: raw.status_conversa,
            tipo_fluxo: raw.tipo_fluxo,
            cliente_id_crm: raw.cliente_id_crm,
            cliente_nome: raw.cliente_nome,
            cliente_telefone: raw.cliente_telefone,
            vendedor_id: raw.vendedor_id,
            vendedor_nome: raw.vendedor_nome,
            vendedor_email: raw.vendedor_email,
            departamento: raw.departamento,
            coluna_kanban: raw.coluna_kanban,
            instancia_id: raw.instancia_id,
            instancia_nome: raw.instancia_nome,
            instancia_telefone: raw.instancia_telefone,
            instancia_tipo: raw.instancia_tipo,
            valor_orcamento: raw.valor_orcamento,
            etapa_funil: raw.etapa_funil,
            produto_interesse: raw.produto_interesse,
            motivo_perda: raw.motivo_perda,
            data_fechamento: raw.data_fechamento,
            acessorios: raw.acessorios,
            msg_direcao: raw.msg_direcao,
            msg_tipo: raw.msg_tipo,
            msg_conteudo: raw.msg_conteudo,
            msg_erro_motivo: raw.msg_erro_motivo,
            evento_timestamp: raw.evento_timestamp,
            ingested_at: raw.ingested_at,
        }
    }
}

/// A whole row of one conversation table, as `to_jsonb`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ConversationSourceRow {
    pub source_priority: i32,
    pub chat_id: String,
    pub data: Value,
}

/// A message from either message table, before unification.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct SourceMessage {
    pub source_priority: i32,
    /// Native id, or a content hash for rows without one.
    pub source_id: String,
    pub chat_id: String,
    pub evento_timestamp: Option<DateTime<Utc>>,
    pub msg_tipo: Option<String>,
    pub msg_conteudo: Option<String>,
    /// Only set by the primary source.
    pub author_type: Option<String>,
    /// Only set by the secondary source.
    pub from_client: Option<bool>,
    pub delivered: Option<bool>,
    pub error_reason: Option<String>,
}

/// Conversation as the dashboard sees it. Blank text columns are `None`.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct DashboardConversation {
    pub chat_id: String,
    pub current_funnel_stage: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub attendant_name: Option<String>,
    pub contact_reason: Option<String>,
    pub budget_value: Option<Decimal>,
    pub ai_agent_rating: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct DashboardMessage {
    pub chat_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub from_client: Option<bool>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> bool;

    /// Newest raw events first.
    async fn recent_events(&self, limit: i64) -> Result<Vec<RawEvent>, sqlx::Error>;

    /// Chat ids of one page of the conversation list: merged conversations
    /// matching `filters`, most recently active first.
    async fn conversation_page(
        &self,
        filters: &ConversationFilters,
        window: Window,
    ) -> Result<Vec<String>, sqlx::Error>;

    /// Rows of both conversation tables for the given chats.
    async fn conversation_sources(
        &self,
        chat_ids: &[String],
    ) -> Result<Vec<ConversationSourceRow>, sqlx::Error>;

    /// Latest message of each given chat in each message table.
    async fn latest_messages(&self, chat_ids: &[String]) -> Result<Vec<SourceMessage>, sqlx::Error>;

    /// All messages of one chat from both message tables.
    async fn chat_messages(&self, chat_id: &str) -> Result<Vec<SourceMessage>, sqlx::Error>;

    /// One row per chat of the `conversations` table matching `filters`.
    async fn dashboard_conversations(
        &self,
        filters: &ConversationFilters,
    ) -> Result<Vec<DashboardConversation>, sqlx::Error>;

    /// Messages of the given chats from the `messages` table.
    async fn dashboard_messages(
        &self,
        chat_ids: &[String],
    ) -> Result<Vec<DashboardMessage>, sqlx::Error>;
}
