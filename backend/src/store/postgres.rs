use std::sync::LazyLock;

use async_trait::async_trait;
use chrono_tz::Tz;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    ConversationSourceRow, DashboardConversation, DashboardMessage, RawEvent, ReportStore,
    SourceMessage,
};
use crate::database;
use crate::pagination::Window;
use crate::reporting::filters::ConversationFilters;
use crate::reporting::reconcile::{
    COLUNA_KANBAN_KEYS, CREATED_AT_KEYS, DATA_CRIACAO_CHAT_KEYS, ETAPA_FUNIL_KEYS,
    STATUS_CONVERSA_KEYS, UPDATED_AT_KEYS, VENDEDOR_NOME_KEYS,
};
use crate::reporting::stages::{conversation_status_sql, status_filter_stages};

const RAW_EVENTS_QUERY: &str = r#"
SELECT
  to_jsonb(r.id) AS id,
  r.chat_id::text AS chat_id,
  r.protocolo::text AS protocolo,
  r.data_criacao_chat::timestamptz AS data_criacao_chat,
  r.status_conversa::text AS status_conversa,
  r.tipo_fluxo::text AS tipo_fluxo,
  r.cliente_id_crm::text AS cliente_id_crm,
  r.cliente_nome::text AS cliente_nome,
  r.cliente_telefone::text AS cliente_telefone,
  r.vendedor_id::text AS vendedor_id,
  r.vendedor_nome::text AS vendedor_nome,
  r.vendedor_email::text AS vendedor_email,
  r.departamento::text AS departamento,
  r.coluna_kanban::text AS coluna_kanban,
  r.instancia_id::text AS instancia_id,
  r.instancia_nome::text AS instancia_nome,
  r.instancia_telefone::text AS instancia_telefone,
  r.instancia_tipo::text AS instancia_tipo,
  r.valor_orcamento::numeric AS valor_orcamento,
  r.etapa_funil::text AS etapa_funil,
  r.produto_interesse::text AS produto_interesse,
  r.motivo_perda::text AS motivo_perda,
  r.data_fechamento::timestamptz AS data_fechamento,
  r.acessorios::text AS acessorios,
  r.msg_direcao::text AS msg_direcao,
  r.msg_tipo::text AS msg_tipo,
  r.msg_conteudo::text AS msg_conteudo,
  r.msg_status_envio::boolean AS msg_delivered,
  r.msg_erro_motivo::text AS msg_erro_motivo,
  COALESCE(r.evento_timestamp, r.data_criacao_chat, r.ingested_at)::timestamptz AS evento_timestamp,
  r.ingested_at::timestamptz AS ingested_at
FROM public.smclick_raw_events r
ORDER BY COALESCE(r.evento_timestamp, r.data_criacao_chat, r.ingested_at) DESC NULLS LAST, r.id DESC
LIMIT $1
"#;

const CONVERSATION_SOURCES_QUERY: &str = r#"
SELECT 1 AS source_priority, c.chat_id::text AS chat_id, to_jsonb(c) AS data
FROM semclick_conversations c
WHERE c.chat_id::text = ANY($1)
UNION ALL
SELECT 2 AS source_priority, c.chat_id::text AS chat_id, to_jsonb(c) AS data
FROM conversations c
WHERE c.chat_id::text = ANY($1)
"#;

/// Timestamp text `parse_timestamp` reads as UTC.
const NAIVE_TIMESTAMP: &str = r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])([T ]([01][0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9](\.[0-9]+)?)?)?$";
/// Timestamp text carrying its own offset.
const OFFSET_TIMESTAMP: &str = r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])[T ]([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\.[0-9]+)?(Z|[+-][0-9]{2}(:?[0-9]{2})?)$";

/// Start of the conversation list page query, up to an open `WHERE`.
///
/// Each source row is reduced to the fields the list filters and sorts on,
/// read through the same alias keys as [`ConversationSource`]. The rows of a
/// chat are then merged field by field in priority order, and the latest
/// message time of the chat is joined in.
///
/// [`ConversationSource`]: crate::reporting::reconcile::ConversationSource
static CONVERSATION_PAGE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    let merged = |field: &str| {
        format!(
            "(array_agg(k.{field} ORDER BY k.source_priority) \
             FILTER (WHERE k.{field} IS NOT NULL))[1] AS {field}"
        )
    };
    let status = conversation_status_sql("m.status_conversa", "m.etapa_funil", "m.coluna_kanban");

    format!(
        r#"WITH sources AS (
  SELECT 1 AS source_priority, c.chat_id::text AS chat_id, to_jsonb(c) AS j
  FROM semclick_conversations c
  WHERE c.chat_id IS NOT NULL
  UNION ALL
  SELECT 2 AS source_priority, c.chat_id::text AS chat_id, to_jsonb(c) AS j
  FROM conversations c
  WHERE c.chat_id IS NOT NULL
),
source_text AS (
  SELECT
    s.source_priority,
    s.chat_id,
    {vendedor} AS vendedor_nome,
    {status_conversa} AS status_conversa,
    {etapa} AS etapa_funil,
    {kanban} AS coluna_kanban,
    {updated} AS updated_at,
    {criacao} AS data_criacao_chat,
    {created} AS created_at
  FROM sources s
),
source_keys AS (
  SELECT
    t.source_priority,
    t.chat_id,
    t.vendedor_nome,
    t.status_conversa,
    t.etapa_funil,
    t.coluna_kanban,
    {updated_ts} AS updated_at,
    {criacao_ts} AS data_criacao_chat,
    {created_ts} AS created_at
  FROM source_text t
),
merged AS (
  SELECT
    k.chat_id,
    {m_vendedor},
    {m_status},
    {m_etapa},
    {m_kanban},
    {m_updated},
    {m_criacao},
    {m_created}
  FROM source_keys k
  GROUP BY k.chat_id
),
latest_activity AS (
  SELECT a.chat_id, MAX(a.ts) AS evento_timestamp
  FROM (
    SELECT sm.chat_id::text AS chat_id, COALESCE(sm.message_time, sm.created_at)::timestamptz AS ts
    FROM semclick_messages sm
    WHERE sm.chat_id IS NOT NULL
    UNION ALL
    SELECT m.chat_id::text AS chat_id, m."timestamp"::timestamptz AS ts
    FROM messages m
    WHERE m.chat_id IS NOT NULL
  ) a
  GROUP BY a.chat_id
),
listed AS (
  SELECT
    m.chat_id,
    m.etapa_funil,
    m.vendedor_nome,
    {status} AS status_normalizado,
    COALESCE(m.updated_at, m.data_criacao_chat, m.created_at) AS filter_at,
    COALESCE(la.evento_timestamp, m.updated_at, m.data_criacao_chat, m.created_at) AS activity_at
  FROM merged m
  LEFT JOIN latest_activity la ON la.chat_id = m.chat_id
)
SELECT l.chat_id
FROM listed l
WHERE TRUE"#,
        vendedor = first_text_sql(VENDEDOR_NOME_KEYS),
        status_conversa = first_text_sql(STATUS_CONVERSA_KEYS),
        etapa = first_text_sql(ETAPA_FUNIL_KEYS),
        kanban = first_text_sql(COLUNA_KANBAN_KEYS),
        updated = first_text_sql(UPDATED_AT_KEYS),
        criacao = first_text_sql(DATA_CRIACAO_CHAT_KEYS),
        created = first_text_sql(CREATED_AT_KEYS),
        updated_ts = timestamp_sql("t.updated_at"),
        criacao_ts = timestamp_sql("t.data_criacao_chat"),
        created_ts = timestamp_sql("t.created_at"),
        m_vendedor = merged("vendedor_nome"),
        m_status = merged("status_conversa"),
        m_etapa = merged("etapa_funil"),
        m_kanban = merged("coluna_kanban"),
        m_updated = merged("updated_at"),
        m_criacao = merged("data_criacao_chat"),
        m_created = merged("created_at"),
    )
});

/// First alias of `keys` holding non-blank text in the JSON row `s.j`.
fn first_text_sql(keys: &[&str]) -> String {
    let candidates: Vec<String> = keys
        .iter()
        .map(|key| format!("NULLIF(BTRIM(s.j->>'{key}', E' \\t\\r\\n'), '')"))
        .collect();
    format!("COALESCE({})", candidates.join(", "))
}

/// Cast of a text column holding a timestamp; unrecognized text is NULL.
fn timestamp_sql(column: &str) -> String {
    format!(
        "CASE WHEN {column} ~ '{NAIVE_TIMESTAMP}' THEN ({column}::timestamp AT TIME ZONE 'UTC') \
         WHEN {column} ~ '{OFFSET_TIMESTAMP}' THEN {column}::timestamptz END"
    )
}

/// Both message tables in one shape, restricted to the chat ids in `$1`.
/// Rows of `messages` without a native id get a hash of chat, time and
/// content so the id stays stable between requests.
const MESSAGES_UNION: &str = r#"
WITH messages_union AS (
  SELECT
    1 AS source_priority,
    sm.id::text AS source_id,
    sm.chat_id::text AS chat_id,
    COALESCE(sm.message_time, sm.created_at)::timestamptz AS evento_timestamp,
    sm.msg_tipo::text AS msg_tipo,
    sm.msg_conteudo::text AS msg_conteudo,
    sm.author_type::text AS author_type,
    NULL::boolean AS from_client,
    sm.msg_status_envio::boolean AS delivered,
    sm.msg_erro_motivo::text AS error_reason
  FROM semclick_messages sm
  WHERE sm.chat_id IS NOT NULL
    AND sm.chat_id::text = ANY($1)

  UNION ALL

  SELECT
    2 AS source_priority,
    COALESCE(
      m.message_id::text,
      md5(COALESCE(m.chat_id::text, '') || '|' || COALESCE(m."timestamp"::text, '') || '|' || COALESCE(m.content, ''))
    ) AS source_id,
    m.chat_id::text AS chat_id,
    m."timestamp"::timestamptz AS evento_timestamp,
    m.message_type::text AS msg_tipo,
    m.content::text AS msg_conteudo,
    NULL::text AS author_type,
    m.from_client::boolean AS from_client,
    NULL::boolean AS delivered,
    NULL::text AS error_reason
  FROM messages m
  WHERE m.chat_id IS NOT NULL
    AND m.chat_id::text = ANY($1)
)
"#;

const DASHBOARD_MESSAGES_QUERY: &str = r#"
SELECT
  m.chat_id::text AS chat_id,
  m."timestamp"::timestamptz AS "timestamp",
  m.content::text AS content,
  m.from_client::boolean AS from_client
FROM messages m
WHERE m.chat_id::text = ANY($1)
"#;

/// [`ReportStore`] over the ingestion database.
#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: PgPool,
    /// Zone whose calendar the dashboard date filters use.
    timezone: Tz,
}

impl PgReportStore {
    pub fn new(pool: PgPool, timezone: Tz) -> Self {
        Self { pool, timezone }
    }

    /// Conversation list page for `filters` and `window`. Ties on activity
    /// keep chat id order.
    fn conversation_page_query<'a>(
        &self,
        filters: &'a ConversationFilters,
        window: Window,
    ) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new(CONVERSATION_PAGE_PREFIX.as_str());

        if let Some(status) = &filters.status {
            qb.push(" AND l.status_normalizado = ").push_bind(status);
        }
        if let Some(etapa) = &filters.etapa {
            qb.push(" AND l.etapa_funil = ").push_bind(etapa);
        }
        if let Some(vendedor) = &filters.vendedor {
            qb.push(" AND l.vendedor_nome = ").push_bind(vendedor);
        }
        if let Some(from) = &filters.date_from {
            qb.push(" AND (l.filter_at AT TIME ZONE ")
                .push_bind(self.timezone.name())
                .push(")::date >= ")
                .push_bind(from)
                .push("::date");
        }
        if let Some(to) = &filters.date_to {
            qb.push(" AND (l.filter_at AT TIME ZONE ")
                .push_bind(self.timezone.name())
                .push(")::date <= ")
                .push_bind(to)
                .push("::date");
        }

        qb.push(r#" ORDER BY l.activity_at DESC NULLS LAST, l.chat_id COLLATE "C" LIMIT "#)
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
        qb
    }

    /// Dashboard conversation query for `filters`: one row per chat, the most
    /// recently started one winning.
    fn dashboard_query<'a>(&self, filters: &'a ConversationFilters) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new(
            r#"SELECT DISTINCT ON (c.chat_id::text)
  c.chat_id::text AS chat_id,
  NULLIF(BTRIM(c.current_funnel_stage::text), '') AS current_funnel_stage,
  c.start_time::timestamptz AS start_time,
  c.created_at::timestamptz AS created_at,
  c.end_time::timestamptz AS end_time,
  NULLIF(BTRIM(c.attendant_name::text), '') AS attendant_name,
  NULLIF(BTRIM(c.contact_reason::text), '') AS contact_reason,
  c.budget_value::numeric AS budget_value,
  NULLIF(BTRIM(c.ai_agent_rating::text), '') AS ai_agent_rating
FROM conversations c
WHERE c.chat_id IS NOT NULL"#,
        );

        if let Some(stages) = filters.status.as_deref().and_then(status_filter_stages) {
            qb.push(" AND c.current_funnel_stage = ANY(")
                .push_bind(stages.iter().map(|s| s.to_string()).collect::<Vec<_>>())
                .push(")");
        }
        if let Some(etapa) = &filters.etapa {
            qb.push(" AND c.current_funnel_stage = ").push_bind(etapa);
        }
        if let Some(from) = &filters.date_from {
            qb.push(" AND (COALESCE(c.start_time, c.created_at)::timestamptz AT TIME ZONE ")
                .push_bind(self.timezone.name())
                .push(")::date >= ")
                .push_bind(from)
                .push("::date");
        }
        if let Some(to) = &filters.date_to {
            qb.push(" AND (COALESCE(c.start_time, c.created_at)::timestamptz AT TIME ZONE ")
                .push_bind(self.timezone.name())
                .push(")::date <= ")
                .push_bind(to)
                .push("::date");
        }
        if let Some(vendedor) = &filters.vendedor {
            qb.push(" AND c.attendant_name = ").push_bind(vendedor);
        }

        qb.push(
            r#"
ORDER BY
  c.chat_id::text,
  COALESCE(c.start_time, c.created_at, c.end_time) DESC NULLS LAST,
  c.created_at DESC NULLS LAST"#,
        );
        qb
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn ping(&self) -> bool {
        database::health_check(&self.pool).await
    }

    async fn recent_events(&self, limit: i64) -> Result<Vec<RawEvent>, sqlx::Error> {
        sqlx::query_as::<_, RawEvent>(RAW_EVENTS_QUERY)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn conversation_page(
        &self,
        filters: &ConversationFilters,
        window: Window,
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut query = self.conversation_page_query(filters, window);
        query
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
    }

    async fn conversation_sources(
        &self,
        chat_ids: &[String],
    ) -> Result<Vec<ConversationSourceRow>, sqlx::Error> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, ConversationSourceRow>(CONVERSATION_SOURCES_QUERY)
            .bind(chat_ids.to_vec())
            .fetch_all(&self.pool)
            .await
    }

    async fn latest_messages(&self, chat_ids: &[String]) -> Result<Vec<SourceMessage>, sqlx::Error> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{MESSAGES_UNION}
SELECT DISTINCT ON (mu.chat_id, mu.source_priority) mu.*
FROM messages_union mu
ORDER BY mu.chat_id, mu.source_priority, mu.evento_timestamp DESC NULLS LAST, mu.source_id DESC"
        );
        sqlx::query_as::<_, SourceMessage>(&query)
            .bind(chat_ids.to_vec())
            .fetch_all(&self.pool)
            .await
    }

    async fn chat_messages(&self, chat_id: &str) -> Result<Vec<SourceMessage>, sqlx::Error> {
        let query = format!("{MESSAGES_UNION} SELECT mu.* FROM messages_union mu");
        sqlx::query_as::<_, SourceMessage>(&query)
            .bind(vec![chat_id.to_string()])
            .fetch_all(&self.pool)
            .await
    }

    async fn dashboard_conversations(
        &self,
        filters: &ConversationFilters,
    ) -> Result<Vec<DashboardConversation>, sqlx::Error> {
        let mut query = self.dashboard_query(filters);
        query
            .build_query_as::<DashboardConversation>()
            .fetch_all(&self.pool)
            .await
    }

    async fn dashboard_messages(
        &self,
        chat_ids: &[String],
    ) -> Result<Vec<DashboardMessage>, sqlx::Error> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, DashboardMessage>(DASHBOARD_MESSAGES_QUERY)
            .bind(chat_ids.to_vec())
            .fetch_all(&self.pool)
            .await
    }
}
