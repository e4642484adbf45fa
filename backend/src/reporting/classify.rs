//! Contact classification for the SDR funnel.
//!
//! Reasons and stages are free text typed by attendants or filled by the AI
//! pipeline. They are lower-cased and stripped of Portuguese accents before
//! matching, and the first rule of [`CONTACT_RULES`] that holds decides the
//! bucket.

use std::sync::LazyLock;

use regex::Regex;

const ACCENTED: &str = "áàâãäéèêëíìîïóòôõöúùûüç";
const PLAIN: &str = "aaaaaeeeeiiiiooooouuuuc";

/// Lower-case and fold accented letters to their base letter.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match ACCENTED.chars().position(|a| a == c) {
            Some(i) => PLAIN.chars().nth(i).unwrap_or(c),
            None => c,
        })
        .collect()
}

static TRACKING_REASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("rastreio").expect("valid tracking pattern"));

/// Support reasons as the SDR funnel sees them.
static SUPPORT_REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sac|pos[- ]?venda|duvidas?|suporte)").expect("valid support pattern")
});

/// Reasons that disqualify a contact from the sales bucket.
static NON_SALES_REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sac|pos[- ]?venda|duvidas?|suporte|rastreio)").expect("valid non-sales pattern")
});

/// Reasons excluded from budget tallies. Differs from [`SUPPORT_REASON`]:
/// tracking counts, `suporte` does not.
static BUDGET_EXCLUDED_REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(pos[- ]?venda|duvidas?|sac|rastreio)").expect("valid budget exclusion pattern")
});

const WAITING_STAGES: &[&str] = &["waiting", "em espera", "aguardando"];

/// Whether a raw contact reason keeps the conversation out of budget tallies.
pub fn is_budget_excluded_reason(reason: Option<&str>) -> bool {
    BUDGET_EXCLUDED_REASON.is_match(&normalize_text(reason.unwrap_or("")))
}

/// Normalized inputs of the contact rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFacts {
    pub reason: String,
    pub stage: String,
    pub has_attendant: bool,
}

impl ContactFacts {
    pub fn new(reason: Option<&str>, stage: Option<&str>, has_attendant: bool) -> Self {
        Self {
            reason: normalize_text(reason.unwrap_or("")),
            stage: normalize_text(stage.unwrap_or("")),
            has_attendant,
        }
    }

    fn is_waiting(&self) -> bool {
        WAITING_STAGES.contains(&self.stage.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactBucket {
    Tracking,
    Support,
    Waiting,
    Sales,
    Uncategorized,
}

pub struct ContactRule {
    pub bucket: ContactBucket,
    pub applies: fn(&ContactFacts) -> bool,
}

/// Evaluated top to bottom; the first match wins.
pub const CONTACT_RULES: &[ContactRule] = &[
    ContactRule {
        bucket: ContactBucket::Tracking,
        applies: |f| TRACKING_REASON.is_match(&f.reason),
    },
    ContactRule {
        bucket: ContactBucket::Support,
        applies: |f| SUPPORT_REASON.is_match(&f.reason),
    },
    ContactRule {
        bucket: ContactBucket::Waiting,
        applies: |f| f.is_waiting(),
    },
    ContactRule {
        bucket: ContactBucket::Sales,
        applies: |f| f.has_attendant && !f.is_waiting() && !NON_SALES_REASON.is_match(&f.reason),
    },
];

pub fn classify_contact(facts: &ContactFacts) -> ContactBucket {
    CONTACT_RULES
        .iter()
        .find(|rule| (rule.applies)(facts))
        .map(|rule| rule.bucket)
        .unwrap_or(ContactBucket::Uncategorized)
}
