//! Funnel stage normalization.
//!
//! The raw stage vocabulary mixes English pipeline states with Portuguese
//! board columns. The dashboard and the conversation list disagree on a few
//! mappings (`active` in particular), so each consumer has its own named rule
//! set instead of one shared table.

use std::collections::HashMap;

use vogaflex_shared::{ContactsBreakdown, StageCount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Triagem,
    Aguardando,
    EmAtendimento,
    Finalizado,
    Ativo,
    SemEtapa,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Triagem => "Triagem",
            Self::Aguardando => "Aguardando",
            Self::EmAtendimento => "Em atendimento",
            Self::Finalizado => "Finalizado",
            Self::Ativo => "Ativo",
            Self::SemEtapa => "Sem etapa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Bucket(Stage),
    /// Known value that must not be reported at all.
    Drop,
}

/// Synonyms are compared case-insensitively and must be written in lower case.
struct SynonymRule {
    synonyms: &'static [&'static str],
    outcome: Outcome,
}

const CLOSED: &[&str] = &["finalizado", "finished", "closed"];

/// `status_normalizado` of the conversation list.
const CONVERSATION_STATUS_RULES: &[SynonymRule] = &[
    SynonymRule { synonyms: &["screening", "triagem"], outcome: Outcome::Bucket(Stage::Triagem) },
    SynonymRule { synonyms: &["waiting", "em espera", "aguardando"], outcome: Outcome::Bucket(Stage::Aguardando) },
    SynonymRule { synonyms: &["em atendimento", "active"], outcome: Outcome::Bucket(Stage::EmAtendimento) },
    SynonymRule { synonyms: CLOSED, outcome: Outcome::Bucket(Stage::Finalizado) },
];

/// Dashboard `stage_counts`.
const STAGE_COUNT_RULES: &[SynonymRule] = &[
    SynonymRule { synonyms: &["screening"], outcome: Outcome::Bucket(Stage::Triagem) },
    SynonymRule { synonyms: &["waiting", "em espera"], outcome: Outcome::Bucket(Stage::Aguardando) },
    SynonymRule { synonyms: &["em atendimento"], outcome: Outcome::Bucket(Stage::EmAtendimento) },
    SynonymRule { synonyms: CLOSED, outcome: Outcome::Bucket(Stage::Finalizado) },
    SynonymRule { synonyms: &["active"], outcome: Outcome::Drop },
];

/// Dashboard `contacts_breakdown`.
const BREAKDOWN_RULES: &[SynonymRule] = &[
    SynonymRule { synonyms: &["screening"], outcome: Outcome::Bucket(Stage::Triagem) },
    SynonymRule { synonyms: &["waiting", "em espera"], outcome: Outcome::Bucket(Stage::Aguardando) },
    SynonymRule { synonyms: &["em atendimento"], outcome: Outcome::Bucket(Stage::EmAtendimento) },
    SynonymRule { synonyms: CLOSED, outcome: Outcome::Bucket(Stage::Finalizado) },
    SynonymRule { synonyms: &["active"], outcome: Outcome::Bucket(Stage::Ativo) },
];

fn lookup(rules: &[SynonymRule], raw: &str) -> Option<Outcome> {
    let lowered = raw.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.synonyms.contains(&lowered.as_str()))
        .map(|rule| rule.outcome)
}

/// Normalized status of a conversation in the list endpoint. The status field
/// decides first; a closed funnel stage or board column still marks the
/// conversation as finished.
pub fn conversation_status(
    status: Option<&str>,
    etapa: Option<&str>,
    kanban: Option<&str>,
) -> Option<Stage> {
    if let Some(Outcome::Bucket(stage)) = status.and_then(|s| lookup(CONVERSATION_STATUS_RULES, s)) {
        return Some(stage);
    }
    let closed = |value: Option<&str>| {
        value.is_some_and(|v| CLOSED.contains(&v.to_lowercase().as_str()))
    };
    (closed(etapa) || closed(kanban)).then_some(Stage::Finalizado)
}

/// [`conversation_status`] as a SQL `CASE` over three text expressions, for
/// filtering before rows leave the database.
pub fn conversation_status_sql(status: &str, etapa: &str, kanban: &str) -> String {
    let mut sql = String::from("CASE");
    for rule in CONVERSATION_STATUS_RULES {
        if let Outcome::Bucket(stage) = rule.outcome {
            sql.push_str(&format!(
                " WHEN LOWER({status}) IN ({}) THEN {}",
                sql_list(rule.synonyms),
                sql_literal(stage.label())
            ));
        }
    }
    let closed = sql_list(CLOSED);
    sql.push_str(&format!(
        " WHEN LOWER({etapa}) IN ({closed}) OR LOWER({kanban}) IN ({closed}) THEN {} END",
        sql_literal(Stage::Finalizado.label())
    ));
    sql
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn sql_list(values: &[&str]) -> String {
    values.iter().map(|v| sql_literal(v)).collect::<Vec<_>>().join(", ")
}

/// Label used by `stage_counts`. Missing stages and `active` are not counted;
/// unknown stages are reported verbatim.
pub fn stage_count_label(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    match lookup(STAGE_COUNT_RULES, raw) {
        Some(Outcome::Bucket(stage)) => Some(stage.label().to_string()),
        Some(Outcome::Drop) => None,
        None => Some(raw.to_string()),
    }
}

/// Label used by `contacts_breakdown`. Every conversation gets one.
pub fn breakdown_label(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return Stage::SemEtapa.label().to_string();
    };
    match lookup(BREAKDOWN_RULES, raw) {
        Some(Outcome::Bucket(stage)) => stage.label().to_string(),
        Some(Outcome::Drop) | None => raw.to_string(),
    }
}

/// Raw `current_funnel_stage` values selected by the dashboard status filter.
/// Unknown display names do not filter.
pub fn status_filter_stages(status: &str) -> Option<&'static [&'static str]> {
    match status {
        "Triagem" => Some(&["screening"]),
        "Aguardando" => Some(&["waiting", "Em espera"]),
        "Em atendimento" => Some(&["Em atendimento"]),
        "Finalizado" => Some(&["Finalizado", "finished", "closed"]),
        _ => None,
    }
}

/// Count labels, largest group first.
pub fn count_labels(labels: impl IntoIterator<Item = String>) -> Vec<StageCount> {
    let mut totals: HashMap<String, i64> = HashMap::new();
    for label in labels {
        *totals.entry(label).or_insert(0) += 1;
    }

    let mut counts: Vec<StageCount> = totals
        .into_iter()
        .map(|(stage_name, total)| StageCount { stage_name, total })
        .collect();
    counts.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.stage_name.cmp(&b.stage_name)));
    counts
}

/// Roll breakdown stages up into finalized / active / pending / other.
pub fn summarize_breakdown(stages: Vec<StageCount>) -> ContactsBreakdown {
    let mut breakdown = ContactsBreakdown::default();

    for stage in &stages {
        breakdown.total += stage.total;
        match stage.stage_name.trim().to_lowercase().as_str() {
            "finalizado" => breakdown.finalized += stage.total,
            "em atendimento" | "ativo" => breakdown.active += stage.total,
            "triagem" | "aguardando" => breakdown.pending += stage.total,
            _ => {}
        }
    }
    breakdown.other =
        (breakdown.total - breakdown.finalized - breakdown.active - breakdown.pending).max(0);
    breakdown.stages = stages;
    breakdown
}
