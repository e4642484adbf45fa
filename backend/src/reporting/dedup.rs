//! Message unification and deduplication.
//!
//! Both message tables may carry the same event. Rows are first projected to
//! [`UnifiedMessage`], then duplicates sharing chat, timestamp, direction,
//! type and content collapse to the copy from the preferred source.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use vogaflex_shared::MessageRow;

use super::direction::{delivery_status, AUTHOR_TYPES};
use crate::store::SourceMessage;

/// Priority of `semclick_messages`; `messages` comes after it.
pub const PRIMARY_MESSAGE_SOURCE: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedMessage {
    pub source_priority: i32,
    pub id: String,
    pub chat_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub msg_tipo: Option<String>,
    pub msg_conteudo: Option<String>,
    pub from_client: Option<bool>,
    pub status_envio: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<SourceMessage> for UnifiedMessage {
    fn from(row: SourceMessage) -> Self {
        let from_client = if row.source_priority == PRIMARY_MESSAGE_SOURCE {
            AUTHOR_TYPES.from_client(row.author_type.as_deref())
        } else {
            row.from_client
        };

        Self {
            status_envio: delivery_status(row.delivered, row.error_reason.as_deref()),
            source_priority: row.source_priority,
            id: row.source_id,
            chat_id: row.chat_id,
            timestamp: row.evento_timestamp,
            msg_tipo: non_blank(row.msg_tipo),
            msg_conteudo: non_blank(row.msg_conteudo),
            from_client,
        }
    }
}

impl From<UnifiedMessage> for MessageRow {
    fn from(msg: UnifiedMessage) -> Self {
        Self {
            id: msg.id,
            chat_id: msg.chat_id,
            evento_timestamp: msg.timestamp,
            msg_conteudo: msg.msg_conteudo,
            msg_tipo: msg.msg_tipo,
            msg_from_client: msg.from_client,
            msg_status_envio: msg.status_envio,
        }
    }
}

type DedupKey = (String, Option<DateTime<Utc>>, Option<bool>, String, String);

fn dedup_key(msg: &UnifiedMessage) -> DedupKey {
    (
        msg.chat_id.clone(),
        msg.timestamp,
        msg.from_client,
        msg.msg_tipo.clone().unwrap_or_default(),
        msg.msg_conteudo.clone().unwrap_or_default(),
    )
}

/// Preferred copy first: lower priority number, then greater id.
fn preference(a: &UnifiedMessage, b: &UnifiedMessage) -> Ordering {
    a.source_priority
        .cmp(&b.source_priority)
        .then_with(|| b.id.cmp(&a.id))
}

/// Thread order: timestamp ascending with unknown timestamps last, then id.
pub fn thread_order(a: &UnifiedMessage, b: &UnifiedMessage) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Keep one copy of each event and return the thread in display order.
/// Messages with neither a type nor content are dropped. Applying this to its
/// own output returns the same messages.
pub fn dedup_thread(messages: Vec<UnifiedMessage>) -> Vec<UnifiedMessage> {
    let mut kept: HashMap<DedupKey, UnifiedMessage> = HashMap::new();

    for msg in messages
        .into_iter()
        .filter(|m| m.msg_tipo.is_some() || m.msg_conteudo.is_some())
    {
        let key = dedup_key(&msg);
        match kept.get(&key) {
            Some(current) if preference(current, &msg) != Ordering::Greater => {}
            _ => {
                kept.insert(key, msg);
            }
        }
    }

    let mut thread: Vec<UnifiedMessage> = kept.into_values().collect();
    thread.sort_by(thread_order);
    thread
}

/// Most recent message of each chat: greatest timestamp (unknown last), then
/// preferred source, then greatest id.
pub fn latest_by_chat(messages: Vec<UnifiedMessage>) -> HashMap<String, UnifiedMessage> {
    fn recency(a: &UnifiedMessage, b: &UnifiedMessage) -> Ordering {
        // Less means "more recent"
        match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| preference(a, b))
    }

    let mut latest: HashMap<String, UnifiedMessage> = HashMap::new();
    for msg in messages {
        match latest.get(&msg.chat_id) {
            Some(current) if recency(current, &msg) != Ordering::Greater => {}
            _ => {
                latest.insert(msg.chat_id.clone(), msg);
            }
        }
    }
    latest
}
