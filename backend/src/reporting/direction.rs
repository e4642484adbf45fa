//! Message direction inference.
//!
//! Each message source spells "who wrote this" with its own vocabulary. A
//! [`DirectionVocabulary`] lists the spellings of one source; anything it does
//! not list is unknown rather than guessed.

/// Client/agent spellings used by one source.
#[derive(Debug, Clone, Copy)]
pub struct DirectionVocabulary {
    pub from_client: &'static [&'static str],
    pub from_agent: &'static [&'static str],
}

/// `smclick_raw_events.msg_direcao`
pub const RAW_EVENT_DIRECTIONS: DirectionVocabulary = DirectionVocabulary {
    from_client: &["inbound", "recebida", "received"],
    from_agent: &["outbound", "enviada", "sent"],
};

/// `semclick_messages.author_type`
pub const AUTHOR_TYPES: DirectionVocabulary = DirectionVocabulary {
    from_client: &["client", "customer", "contato", "cliente", "inbound"],
    from_agent: &[
        "agent", "attendant", "vendedor", "seller", "outbound", "system", "bot",
    ],
};

impl DirectionVocabulary {
    /// `Some(true)` for the client, `Some(false)` for the agent side, `None`
    /// when the label is missing or not in the vocabulary.
    pub fn from_client(&self, label: Option<&str>) -> Option<bool> {
        let label = label?.to_lowercase();
        if self.from_client.contains(&label.as_str()) {
            Some(true)
        } else if self.from_agent.contains(&label.as_str()) {
            Some(false)
        } else {
            None
        }
    }
}

/// Delivery status shown next to a message: `None` when delivered or unknown,
/// otherwise the failure reason (`"false"` when no reason was recorded).
pub fn delivery_status(delivered: Option<bool>, error_reason: Option<&str>) -> Option<String> {
    match delivered {
        Some(false) => Some(
            error_reason
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .unwrap_or("false")
                .to_string(),
        ),
        _ => None,
    }
}
