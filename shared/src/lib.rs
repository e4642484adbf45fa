//! Response models for the reporting API.
//!
//! Field names mirror the JSON keys the dashboard frontend consumes, which is
//! why most of them are Portuguese.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body returned on any failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ==================== Events ====================

/// One row of the flat ingestion log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRow {
    /// Stored id with its native JSON type.
    pub id: Option<serde_json::Value>,
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
    pub msg_from_client: Option<bool>,
    pub msg_tipo: Option<String>,
    pub msg_conteudo: Option<String>,
    pub msg_status_envio: Option<String>,
    pub msg_erro_motivo: Option<String>,
    pub evento_timestamp: Option<DateTime<Utc>>,
    pub ingested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<EventRow>,
}

// ==================== Conversations ====================

/// A reconciled conversation joined with its latest message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationRow {
    pub chat_id: String,
    pub protocolo: Option<String>,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
    pub vendedor_nome: Option<String>,
    pub vendedor_email: Option<String>,
    pub status_conversa: Option<String>,
    pub status_normalizado: Option<String>,
    pub etapa_funil: Option<String>,
    pub departamento: Option<String>,
    pub coluna_kanban: Option<String>,
    pub data_criacao_chat: Option<DateTime<Utc>>,
    pub data_fechamento: Option<DateTime<Utc>>,
    pub valor_orcamento: String,
    pub motivo_perda: Option<String>,
    pub produto_interesse: Option<String>,
    pub ai_agent_rating: Option<String>,
    pub ai_customer_sentiment: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_suggestion: Option<String>,
    pub contact_reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub msg_tipo: Option<String>,
    pub msg_conteudo: Option<String>,
    pub msg_status_envio: Option<String>,
    pub evento_timestamp: Option<DateTime<Utc>>,
    pub msg_from_client: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationRow>,
}

// ==================== Messages ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub evento_timestamp: Option<DateTime<Utc>>,
    pub msg_conteudo: Option<String>,
    pub msg_tipo: Option<String>,
    pub msg_from_client: Option<bool>,
    pub msg_status_envio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageRow>,
}

// ==================== Dashboard ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub stage_counts: Vec<StageCount>,
    pub contacts_breakdown: ContactsBreakdown,
    pub sdr: SdrReport,
    pub vendors: VendorReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub avg_duration_seconds: f64,
    pub avg_handoff_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage_name: String,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsBreakdown {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub finalized: i64,
    pub other: i64,
    pub stages: Vec<StageCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdrReport {
    pub summary: SdrSummary,
    pub daily: Vec<SdrDay>,
    pub transferred_daily: Vec<TransferredDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdrSummary {
    pub contacts: i64,
    pub tracking: i64,
    pub sac: i64,
    pub waiting: i64,
    pub sales: i64,
    pub transferred: i64,
    pub dead: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdrDay {
    pub day: Option<NaiveDate>,
    pub contacts: i64,
    /// Conversations that reached an attendant on that day.
    pub tracking: i64,
    pub dead: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredDay {
    pub day: Option<NaiveDate>,
    pub transferred: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorReport {
    pub summary: Vec<VendorSummary>,
    pub scores: BTreeMap<String, Vec<VendorScore>>,
}

/// Per-attendant performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub vendedor: String,
    pub contacts_received: i64,
    pub budgets_count: i64,
    pub budgets_detected_count: i64,
    pub budgets_sum: f64,
    pub budgets_sum_detected: f64,
    pub dead_contacts: i64,
    pub avg_duration_seconds: f64,
    pub avg_handoff_seconds: f64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorScore {
    pub score: String,
    pub total: i64,
}
