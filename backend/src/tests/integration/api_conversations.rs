// Integration tests for /api/conversations/

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::pagination::Window;
use crate::store::{ConversationSourceRow, MockReportStore};
use crate::tests::fixtures::*;
use crate::tests::helpers::{get_json, test_app};

fn with_fields(mut base: Value, fields: Value) -> Value {
    if let (Some(base), Some(fields)) = (base.as_object_mut(), fields.as_object()) {
        base.extend(fields.clone());
    }
    base
}

fn ids_are(ids: &[String], expected: &[&str]) -> bool {
    ids.iter().map(String::as_str).eq(expected.iter().copied())
}

/// Rows of both conversation tables for c1, c2 and c3.
fn sources() -> Vec<ConversationSourceRow> {
    vec![
        legacy_conversation(
            "c1",
            with_fields(conversation_json("c1"), json!({
                "customer_name": "Maria",
                "attendant_name": "Bruno",
                "budget_value": 1500.5,
                "start_time": "2024-03-01 10:00:00",
            })),
        ),
        semclick_conversation(
            "c1",
            with_fields(conversation_json("c1"), json!({
                "cliente_nome": "   ",
                "status_conversa": "closed",
                "vendedor_nome": "Ana",
                "updated_at": "2024-03-04T12:00:00Z",
                "valor_orcamento": "",
            })),
        ),
        legacy_conversation(
            "c2",
            json!({
                "customer_name": "João",
                "current_funnel_stage": "waiting",
                "updated_at": "2024-03-05T12:00:00+00:00",
            }),
        ),
        semclick_conversation(
            "c3",
            json!({"status": "novo", "updated_at": "not a date"}),
        ),
    ]
}

/// Store whose page query answers `page`.
fn store(page: &'static [&'static str]) -> MockReportStore {
    let mut store = MockReportStore::new();
    store
        .expect_conversation_page()
        .returning(move |_, _| Ok(page.iter().map(|id| id.to_string()).collect()));
    store
        .expect_conversation_sources()
        .withf(move |ids| ids_are(ids, page))
        .returning(|_| Ok(sources()));
    store
        .expect_latest_messages()
        .withf(move |ids| ids_are(ids, page))
        .returning(|_| {
            Ok(vec![
                legacy_message("x", "c1", Some(march(5, 0, 0)), Some(false), "Bom dia"),
                semclick_message("m1", "c1", Some(march(6, 12, 0)), "cliente", "Obrigado!"),
            ])
        });
    store
}

fn chat_ids(body: &Value) -> Vec<String> {
    body["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["chat_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn sources_are_merged_field_by_field() {
    let (status, body) = get_json(test_app(store(&["c1", "c2", "c3"])), "/api/conversations/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat_ids(&body), vec!["c1", "c2", "c3"]);

    let c1 = &body["conversations"][0];
    // blank primary value falls back to the secondary source
    assert_eq!(c1["cliente_nome"], json!("Maria"));
    assert_eq!(c1["vendedor_nome"], json!("Ana"));
    assert_eq!(c1["status_normalizado"], json!("Finalizado"));
    assert_eq!(c1["valor_orcamento"], json!("1500.5"));
    assert_eq!(c1["data_criacao_chat"], json!("2024-03-01T10:00:00Z"));
    // latest message across both tables
    assert_eq!(c1["msg_conteudo"], json!("Obrigado!"));
    assert_eq!(c1["msg_from_client"], json!(true));

    let c2 = &body["conversations"][1];
    assert_eq!(c2["status_normalizado"], json!("Aguardando"));
    assert_eq!(c2["etapa_funil"], json!("waiting"));
    assert_eq!(c2["valor_orcamento"], json!("0"));
    assert_eq!(c2["msg_conteudo"], json!(null));

    let c3 = &body["conversations"][2];
    assert_eq!(c3["updated_at"], json!(null));
    assert_eq!(c3["status_normalizado"], json!(null));
}

#[tokio::test]
async fn only_the_page_is_read_and_its_order_kept() {
    let (status, body) = get_json(test_app(store(&["c3", "c1"])), "/api/conversations/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat_ids(&body), vec!["c3", "c1"]);
}

#[tokio::test]
async fn filters_and_window_reach_the_store_normalized() {
    let mut store = MockReportStore::new();
    store
        .expect_conversation_page()
        .withf(|filters, window| {
            filters.status.as_deref() == Some("Finalizado")
                && filters.vendedor.is_none()
                && filters.etapa.as_deref() == Some("waiting")
                && filters.date_from.as_deref() == Some("2024-03-05")
                && filters.date_to.is_none()
                && *window == Window { limit: 1, offset: 1 }
        })
        .returning(|_, _| Ok(Vec::new()));

    let (status, body) = get_json(
        test_app(store),
        "/api/conversations?status=Finalizado&vendedor=Todos&etapa=waiting\
         &date_from=2024-03-05T00:00:00&date_to=&limit=1&offset=1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // an empty page reads nothing else
    assert_eq!(body, json!({"conversations": []}));
}

#[tokio::test]
async fn default_window_is_two_hundred() {
    let mut store = MockReportStore::new();
    store
        .expect_conversation_page()
        .withf(|filters, window| {
            filters.status.is_none()
                && filters.etapa.is_none()
                && filters.vendedor.is_none()
                && filters.date_from.is_none()
                && *window == Window { limit: 200, offset: 0 }
        })
        .returning(|_, _| Ok(Vec::new()));

    let (status, _) = get_json(test_app(store), "/api/conversations/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_date_is_reported_as_error_body() {
    let (status, body) = get_json(
        test_app(MockReportStore::new()),
        "/api/conversations/?date_from=ontem",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("date_from"));
}

#[tokio::test]
async fn database_failure_is_reported_as_error_body() {
    let mut store = MockReportStore::new();
    store
        .expect_conversation_page()
        .returning(|_, _| Err(sqlx::Error::PoolTimedOut));

    let (status, body) = get_json(test_app(store), "/api/conversations/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty());
}
