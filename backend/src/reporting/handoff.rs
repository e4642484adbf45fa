//! Bot-to-human handoff detection.
//!
//! The chatbot announces a transfer to the sales team with a handful of fixed
//! sentences. The first agent-side message containing one of them marks the
//! handoff; the first agent-side message after it that is not one of them is
//! the human's first response. Rephrased templates are missed.

use chrono::{DateTime, Utc};

use crate::store::DashboardMessage;

/// Sentences the bot uses when handing a chat to sales.
pub const HANDOFF_PHRASES: &[&str] = &[
    "Agradeço pelas informações! Estou direcionando o seu atendimento ao nosso setor de vendas",
    "Vou verificar a disponibilidade com nosso time de vendas. Agradeço pelas informações! Estou direcionando o seu atendimento ao nosso setor de vendas",
    "Agradeço pelas informações! Estou direcionando o seu atendimento ao nosso time de vendas",
    "Vou direcionar seu atendimento ao nosso time de vendas",
    "Vou encaminhar ao nosso time de vendas",
    "Obrigado, vou encaminhar ao nosso time de vendas",
    "Obrigada, vou encaminhar ao nosso time de vendas",
    "atendimento ao nosso setor de vendas.",
];

/// Case-insensitive substring matcher over a phrase list.
#[derive(Debug, Clone)]
pub struct HandoffRules {
    phrases: Vec<String>,
}

impl Default for HandoffRules {
    fn default() -> Self {
        Self::new(HANDOFF_PHRASES.iter().copied())
    }
}

/// Timestamps of a detected handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub transferred_at: DateTime<Utc>,
    pub first_human_at: Option<DateTime<Utc>>,
}

impl HandoffRules {
    pub fn new<'a>(phrases: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            phrases: phrases.into_iter().map(str::to_lowercase).collect(),
        }
    }

    pub fn is_handoff(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.phrases.iter().any(|phrase| content.contains(phrase.as_str()))
    }

    /// Handoff of one chat's messages, if the bot ever announced one.
    pub fn detect(&self, messages: &[DashboardMessage]) -> Option<Handoff> {
        let agent = || messages.iter().filter(|m| m.from_client == Some(false));

        let transferred_at = agent()
            .filter(|m| m.content.as_deref().is_some_and(|c| self.is_handoff(c)))
            .filter_map(|m| m.timestamp)
            .min()?;

        let first_human_at = agent()
            .filter(|m| m.content.as_deref().is_none_or(|c| !self.is_handoff(c)))
            .filter_map(|m| m.timestamp)
            .filter(|ts| *ts > transferred_at)
            .min();

        Some(Handoff { transferred_at, first_human_at })
    }
}
