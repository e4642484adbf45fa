//! Budget extraction.
//!
//! A conversation's budget is the value stored by the CRM when there is one.
//! Otherwise attendants usually quote it in the chat ("fica em R$ 1.250,00"),
//! so the largest amount quoted in any message stands in for it.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// `R$` followed by a Brazilian-formatted amount: `.` groups thousands and
/// `,` introduces two decimal places.
static BRL_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"R\$\s*([0-9.]+(?:,[0-9]{2})?)").expect("valid amount pattern")
});

/// Every amount quoted in `text`, in order of appearance. Amounts with more
/// digits than a [`Decimal`] holds count as [`Decimal::MAX`].
pub fn quoted_amounts(text: &str) -> Vec<Decimal> {
    BRL_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| {
            let normalized = m.as_str().replace('.', "").replace(',', ".");
            if normalized.is_empty() {
                return None;
            }
            // only digits and one decimal point remain, so parsing can only overflow
            Some(Decimal::from_str(&normalized).unwrap_or(Decimal::MAX))
        })
        .collect()
}

/// Largest amount quoted across a chat's messages.
pub fn max_quoted_amount<'a>(contents: impl IntoIterator<Item = &'a str>) -> Option<Decimal> {
    contents.into_iter().flat_map(quoted_amounts).max()
}

/// Budget sources of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetEvidence {
    /// Value stored on the conversation record.
    pub stated: Option<Decimal>,
    /// Largest amount quoted in its messages.
    pub quoted: Option<Decimal>,
    /// Contact reason is support or tracking: never counts as a sale.
    pub excluded: bool,
}

impl BudgetEvidence {
    fn stated_positive(&self) -> Option<Decimal> {
        self.stated.filter(|v| *v > Decimal::ZERO)
    }
}

/// Per-attendant budget counters. Sums saturate at [`Decimal::MAX`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetTally {
    /// Conversations with a stated budget.
    pub stated_count: i64,
    /// Conversations with a stated or a quoted budget.
    pub detected_count: i64,
    pub stated_sum: Decimal,
    /// Quoted amounts of conversations without a stated budget.
    pub detected_sum: Decimal,
}

impl BudgetTally {
    pub fn add(&mut self, evidence: &BudgetEvidence) {
        if evidence.excluded {
            return;
        }

        match evidence.stated_positive() {
            Some(stated) => {
                self.stated_count += 1;
                self.detected_count += 1;
                self.stated_sum = self.stated_sum.saturating_add(stated);
            }
            None => {
                if let Some(quoted) = evidence.quoted {
                    self.detected_count += 1;
                    self.detected_sum = self.detected_sum.saturating_add(quoted);
                }
            }
        }
    }
}
