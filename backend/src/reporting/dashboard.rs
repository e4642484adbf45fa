//! Dashboard assembly.
//!
//! The store hands over the filtered conversations and every message of those
//! conversations; all metrics are derived here.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use vogaflex_shared::{
    DashboardResponse, DashboardStats, SdrDay, SdrReport, SdrSummary, TransferredDay,
    VendorReport, VendorScore, VendorSummary,
};

use super::budget::{max_quoted_amount, BudgetEvidence, BudgetTally};
use super::classify::{classify_contact, is_budget_excluded_reason, ContactBucket, ContactFacts};
use super::stages::{breakdown_label, count_labels, stage_count_label, summarize_breakdown};
use super::{Handoff, ReportRules};
use crate::store::{DashboardConversation, DashboardMessage};

/// Score bucket for conversations the AI never rated.
pub const UNSCORED: &str = "Sem score";

/// Everything derived from one conversation's messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatActivity {
    pub first_client_at: Option<DateTime<Utc>>,
    pub agent_messages: i64,
    pub handoff: Option<Handoff>,
    pub quoted_budget: Option<Decimal>,
}

impl ChatActivity {
    pub fn from_messages(messages: &[DashboardMessage], rules: &ReportRules) -> Self {
        Self {
            first_client_at: messages
                .iter()
                .filter(|m| m.from_client == Some(true))
                .filter_map(|m| m.timestamp)
                .min(),
            agent_messages: messages.iter().filter(|m| m.from_client == Some(false)).count() as i64,
            handoff: rules.handoff.detect(messages),
            quoted_budget: max_quoted_amount(messages.iter().filter_map(|m| m.content.as_deref())),
        }
    }

    /// No agent (bot or human) ever answered.
    pub fn is_dead(&self) -> bool {
        self.agent_messages == 0
    }
}

/// A conversation with its derived metrics.
struct Scored<'a> {
    conversation: &'a DashboardConversation,
    activity: ChatActivity,
    /// First client message to close, in business seconds.
    duration: Option<f64>,
    /// Handoff to first human reply, in business seconds.
    handoff_wait: Option<f64>,
}

impl<'a> Scored<'a> {
    fn new(conversation: &'a DashboardConversation, messages: &[DashboardMessage], rules: &ReportRules) -> Self {
        let activity = ChatActivity::from_messages(messages, rules);
        let hours = &rules.business_hours;
        let duration = hours.seconds_between(activity.first_client_at, conversation.end_time);
        let handoff_wait = activity
            .handoff
            .and_then(|h| hours.seconds_between(Some(h.transferred_at), h.first_human_at));

        Self {
            conversation,
            activity,
            duration,
            handoff_wait,
        }
    }

    fn attendant(&self) -> Option<&'a str> {
        self.conversation.attendant_name.as_deref()
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Numeric part of an AI rating such as `"8/10"` or `"nota 7.5"`: every
/// character except digits and dots is dropped.
pub fn rating_value(rating: &str) -> Option<f64> {
    let digits: String = rating
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

pub fn build_dashboard(
    conversations: &[DashboardConversation],
    messages: Vec<DashboardMessage>,
    rules: &ReportRules,
) -> DashboardResponse {
    let mut by_chat: HashMap<String, Vec<DashboardMessage>> = HashMap::new();
    for message in messages {
        by_chat.entry(message.chat_id.clone()).or_default().push(message);
    }

    let scored: Vec<Scored> = conversations
        .iter()
        .map(|c| {
            let thread = by_chat.get(&c.chat_id).map(Vec::as_slice).unwrap_or(&[]);
            Scored::new(c, thread, rules)
        })
        .collect();

    tracing::debug!(
        conversations = scored.len(),
        "Built dashboard metrics"
    );

    DashboardResponse {
        stats: DashboardStats {
            avg_duration_seconds: mean(scored.iter().filter_map(|s| s.duration)).unwrap_or(0.0),
            avg_handoff_seconds: mean(scored.iter().filter_map(|s| s.handoff_wait)).unwrap_or(0.0),
        },
        stage_counts: count_labels(
            scored
                .iter()
                .filter_map(|s| stage_count_label(s.conversation.current_funnel_stage.as_deref())),
        ),
        contacts_breakdown: summarize_breakdown(count_labels(
            scored
                .iter()
                .filter(|s| s.attendant().is_some())
                .map(|s| breakdown_label(s.conversation.current_funnel_stage.as_deref())),
        )),
        sdr: sdr_report(&scored, rules),
        vendors: vendor_report(&scored),
    }
}

fn sdr_report(scored: &[Scored], rules: &ReportRules) -> SdrReport {
    let mut summary = SdrSummary {
        contacts: scored.len() as i64,
        ..Default::default()
    };
    let mut daily: BTreeMap<Option<NaiveDate>, SdrDay> = BTreeMap::new();
    let mut transferred: BTreeMap<Option<NaiveDate>, i64> = BTreeMap::new();
    let hours = &rules.business_hours;

    for s in scored {
        let conv = s.conversation;
        let facts = ContactFacts::new(
            conv.contact_reason.as_deref(),
            conv.current_funnel_stage.as_deref(),
            s.attendant().is_some(),
        );
        match classify_contact(&facts) {
            ContactBucket::Tracking => summary.tracking += 1,
            ContactBucket::Support => summary.sac += 1,
            ContactBucket::Waiting => summary.waiting += 1,
            ContactBucket::Sales => summary.sales += 1,
            ContactBucket::Uncategorized => {}
        }
        if s.activity.is_dead() {
            summary.dead += 1;
        }

        let day_key = conv.start_time.or(conv.created_at).map(|ts| hours.local_date(ts));
        let day = daily.entry(day_key).or_insert_with(|| SdrDay {
            day: day_key,
            contacts: 0,
            tracking: 0,
            dead: 0,
        });
        day.contacts += 1;
        if s.attendant().is_some() {
            day.tracking += 1;
        }
        if s.activity.is_dead() {
            day.dead += 1;
        }

        if let Some(handoff) = s.activity.handoff {
            summary.transferred += 1;
            *transferred
                .entry(Some(hours.local_date(handoff.transferred_at)))
                .or_insert(0) += 1;
        }
    }

    SdrReport {
        summary,
        daily: dated_last_undated(daily.into_values().collect(), |d| d.day.is_none()),
        transferred_daily: dated_last_undated(
            transferred
                .into_iter()
                .map(|(day, transferred)| TransferredDay { day, transferred })
                .collect(),
            |d| d.day.is_none(),
        ),
    }
}

/// `BTreeMap` sorts `None` first; reports list undated rows last.
fn dated_last_undated<T>(rows: Vec<T>, undated: impl Fn(&T) -> bool) -> Vec<T> {
    let (mut dated, rest): (Vec<T>, Vec<T>) = rows.into_iter().partition(|r| !undated(r));
    dated.extend(rest);
    dated
}

#[derive(Default)]
struct VendorAccumulator {
    contacts: i64,
    dead: i64,
    budgets: BudgetTally,
    durations: Vec<f64>,
    handoff_waits: Vec<f64>,
    ratings: Vec<f64>,
    scores: BTreeMap<String, i64>,
}

fn vendor_report(scored: &[Scored]) -> VendorReport {
    let mut vendors: BTreeMap<&str, VendorAccumulator> = BTreeMap::new();

    for s in scored {
        let Some(attendant) = s.attendant() else {
            continue;
        };
        let conv = s.conversation;
        let acc = vendors.entry(attendant).or_default();

        acc.contacts += 1;
        if s.activity.is_dead() {
            acc.dead += 1;
        }
        acc.budgets.add(&BudgetEvidence {
            stated: conv.budget_value,
            quoted: s.activity.quoted_budget,
            excluded: is_budget_excluded_reason(conv.contact_reason.as_deref()),
        });
        acc.durations.extend(s.duration);
        acc.handoff_waits.extend(s.handoff_wait);
        acc.ratings.extend(conv.ai_agent_rating.as_deref().and_then(rating_value));

        let score = conv.ai_agent_rating.clone().unwrap_or_else(|| UNSCORED.to_string());
        *acc.scores.entry(score).or_insert(0) += 1;
    }

    let mut summary = Vec::with_capacity(vendors.len());
    let mut scores = BTreeMap::new();
    for (attendant, acc) in vendors {
        summary.push(VendorSummary {
            vendedor: attendant.to_string(),
            contacts_received: acc.contacts,
            budgets_count: acc.budgets.stated_count,
            budgets_detected_count: acc.budgets.detected_count,
            budgets_sum: acc.budgets.stated_sum.to_f64().unwrap_or(0.0),
            budgets_sum_detected: acc.budgets.detected_sum.to_f64().unwrap_or(0.0),
            dead_contacts: acc.dead,
            avg_duration_seconds: mean(acc.durations).unwrap_or(0.0),
            avg_handoff_seconds: mean(acc.handoff_waits).unwrap_or(0.0),
            avg_score: mean(acc.ratings).unwrap_or(0.0),
        });
        scores.insert(
            attendant.to_string(),
            acc.scores
                .into_iter()
                .map(|(score, total)| VendorScore { score, total })
                .collect(),
        );
    }
    // stable sort keeps attendants with equal counts in name order
    summary.sort_by(|a, b| b.contacts_received.cmp(&a.contacts_received));

    VendorReport { summary, scores }
}
