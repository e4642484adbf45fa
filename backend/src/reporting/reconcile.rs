//! Conversation source reconciliation.
//!
//! Two tables describe the same chats with different column names. Each
//! source exposes the canonical fields through [`ConversationSource`]; the
//! merge walks the sources of one chat in priority order and takes, field by
//! field, the first value that is present.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::store::ConversationSourceRow;

/// Budget reported when no source carries one.
pub const DEFAULT_BUDGET: &str = "0";

/// Canonical view of one conversation source row. Every text accessor returns
/// `None` for missing or blank values.
pub trait ConversationSource {
    /// Lower wins.
    fn priority(&self) -> i32;
    fn chat_id(&self) -> &str;

    fn protocolo(&self) -> Option<String>;
    fn cliente_nome(&self) -> Option<String>;
    fn cliente_telefone(&self) -> Option<String>;
    fn vendedor_nome(&self) -> Option<String>;
    fn vendedor_email(&self) -> Option<String>;
    fn status_conversa(&self) -> Option<String>;
    fn etapa_funil(&self) -> Option<String>;
    fn departamento(&self) -> Option<String>;
    fn coluna_kanban(&self) -> Option<String>;
    fn motivo_perda(&self) -> Option<String>;
    fn produto_interesse(&self) -> Option<String>;
    fn ai_agent_rating(&self) -> Option<String>;
    fn ai_customer_sentiment(&self) -> Option<String>;
    fn ai_summary(&self) -> Option<String>;
    fn ai_suggestion(&self) -> Option<String>;
    fn contact_reason(&self) -> Option<String>;
    fn valor_orcamento(&self) -> Option<String>;

    fn data_criacao_chat(&self) -> Option<DateTime<Utc>>;
    fn data_fechamento(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// One reconciled conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    pub chat_id: String,
    pub protocolo: Option<String>,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
    pub vendedor_nome: Option<String>,
    pub vendedor_email: Option<String>,
    pub status_conversa: Option<String>,
    pub etapa_funil: Option<String>,
    pub departamento: Option<String>,
    pub coluna_kanban: Option<String>,
    pub motivo_perda: Option<String>,
    pub produto_interesse: Option<String>,
    pub ai_agent_rating: Option<String>,
    pub ai_customer_sentiment: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_suggestion: Option<String>,
    pub contact_reason: Option<String>,
    pub data_criacao_chat: Option<DateTime<Utc>>,
    pub data_fechamento: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub valor_orcamento: String,
}

impl Conversation {
    /// Merge sources that share a chat id. `sources` must already be in
    /// priority order.
    fn merge<S: ConversationSource>(chat_id: String, sources: &[S]) -> Self {
        fn first<S, T>(sources: &[S], field: impl Fn(&S) -> Option<T>) -> Option<T> {
            sources.iter().find_map(field)
        }

        Self {
            chat_id,
            protocolo: first(sources, S::protocolo),
            cliente_nome: first(sources, S::cliente_nome),
            cliente_telefone: first(sources, S::cliente_telefone),
            vendedor_nome: first(sources, S::vendedor_nome),
            vendedor_email: first(sources, S::vendedor_email),
            status_conversa: first(sources, S::status_conversa),
            etapa_funil: first(sources, S::etapa_funil),
            departamento: first(sources, S::departamento),
            coluna_kanban: first(sources, S::coluna_kanban),
            motivo_perda: first(sources, S::motivo_perda),
            produto_interesse: first(sources, S::produto_interesse),
            ai_agent_rating: first(sources, S::ai_agent_rating),
            ai_customer_sentiment: first(sources, S::ai_customer_sentiment),
            ai_summary: first(sources, S::ai_summary),
            ai_suggestion: first(sources, S::ai_suggestion),
            contact_reason: first(sources, S::contact_reason),
            data_criacao_chat: first(sources, S::data_criacao_chat),
            data_fechamento: first(sources, S::data_fechamento),
            updated_at: first(sources, S::updated_at),
            created_at: first(sources, S::created_at),
            valor_orcamento: first(sources, S::valor_orcamento)
                .unwrap_or_else(|| DEFAULT_BUDGET.to_string()),
        }
    }
}

/// Collapse source rows to one conversation per chat id, ordered by chat id.
pub fn reconcile<S: ConversationSource>(rows: Vec<S>) -> Vec<Conversation> {
    let mut by_chat: BTreeMap<String, Vec<S>> = BTreeMap::new();
    for row in rows {
        by_chat.entry(row.chat_id().to_string()).or_default().push(row);
    }

    by_chat
        .into_iter()
        .map(|(chat_id, mut sources)| {
            sources.sort_by_key(|s| s.priority());
            Conversation::merge(chat_id, &sources)
        })
        .collect()
}

// ==================== JSON-backed sources ====================

// Keys tried, in order, for the fields the conversation list filters and
// sorts on. The list query reads the same keys in SQL.
pub const VENDEDOR_NOME_KEYS: &[&str] = &["vendedor_nome", "attendant_name", "current_attendant_name"];
pub const STATUS_CONVERSA_KEYS: &[&str] = &["status_conversa", "current_funnel_stage", "status"];
pub const ETAPA_FUNIL_KEYS: &[&str] = &[
    "etapa_funil_atual",
    "etapa_funil",
    "funnel_stage",
    "current_funnel_stage",
    "coluna_kanban",
    "kanban_column",
];
pub const COLUNA_KANBAN_KEYS: &[&str] = &["coluna_kanban", "kanban_column"];
pub const DATA_CRIACAO_CHAT_KEYS: &[&str] = &["data_criacao_chat", "start_time", "created_at"];
pub const UPDATED_AT_KEYS: &[&str] = &[
    "updated_at",
    "ultima_atualizacao",
    "evento_timestamp",
    "start_time",
    "created_at",
];
pub const CREATED_AT_KEYS: &[&str] = &["created_at", "data_criacao_chat", "start_time"];

/// Trimmed text of the first key holding a non-blank value.
fn json_text(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match data.get(*key)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    })
}

fn json_timestamp(data: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    json_text(data, keys).and_then(|text| parse_timestamp(&text))
}

/// Parse a timestamp stored as text. Values must start with `YYYY-MM-DD`;
/// anything else, or anything that fails to parse after that prefix, is
/// treated as absent. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if !has_date_prefix(text) {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(text, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn has_date_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// A row of either conversation table, read through `to_jsonb`. Both tables
/// share one key list: each key only exists in one of the schemas.
impl ConversationSource for ConversationSourceRow {
    fn priority(&self) -> i32 {
        self.source_priority
    }

    fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn protocolo(&self) -> Option<String> {
        json_text(&self.data, &["protocolo", "protocol"])
    }

    fn cliente_nome(&self) -> Option<String> {
        json_text(&self.data, &["cliente_nome", "customer_name"])
    }

    fn cliente_telefone(&self) -> Option<String> {
        json_text(&self.data, &["cliente_telefone", "customer_phone"])
    }

    fn vendedor_nome(&self) -> Option<String> {
        json_text(&self.data, VENDEDOR_NOME_KEYS)
    }

    fn vendedor_email(&self) -> Option<String> {
        json_text(&self.data, &["vendedor_email", "attendant_email"])
    }

    fn status_conversa(&self) -> Option<String> {
        json_text(&self.data, STATUS_CONVERSA_KEYS)
    }

    fn etapa_funil(&self) -> Option<String> {
        json_text(&self.data, ETAPA_FUNIL_KEYS)
    }

    fn departamento(&self) -> Option<String> {
        json_text(&self.data, &["departamento", "department_name"])
    }

    fn coluna_kanban(&self) -> Option<String> {
        json_text(&self.data, COLUNA_KANBAN_KEYS)
    }

    fn motivo_perda(&self) -> Option<String> {
        json_text(
            &self.data,
            &["motivo_perda_atual", "motivo_perda", "finish_reason"],
        )
    }

    fn produto_interesse(&self) -> Option<String> {
        json_text(&self.data, &["produto_interesse_atual", "produto_interesse"])
    }

    fn ai_agent_rating(&self) -> Option<String> {
        json_text(&self.data, &["ai_agent_rating"])
    }

    fn ai_customer_sentiment(&self) -> Option<String> {
        json_text(&self.data, &["ai_customer_sentiment"])
    }

    fn ai_summary(&self) -> Option<String> {
        json_text(&self.data, &["ai_summary"])
    }

    fn ai_suggestion(&self) -> Option<String> {
        json_text(&self.data, &["ai_suggestion"])
    }

    fn contact_reason(&self) -> Option<String> {
        json_text(&self.data, &["contact_reason"])
    }

    fn valor_orcamento(&self) -> Option<String> {
        json_text(
            &self.data,
            &["valor_orcamento_atual", "valor_orcamento", "budget_value"],
        )
    }

    fn data_criacao_chat(&self) -> Option<DateTime<Utc>> {
        json_timestamp(&self.data, DATA_CRIACAO_CHAT_KEYS)
    }

    fn data_fechamento(&self) -> Option<DateTime<Utc>> {
        json_timestamp(
            &self.data,
            &["data_fechamento_atual", "data_fechamento", "end_time"],
        )
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        json_timestamp(&self.data, UPDATED_AT_KEYS)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        json_timestamp(&self.data, CREATED_AT_KEYS)
    }
}
