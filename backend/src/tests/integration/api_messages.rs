// Integration tests for /api/messages/

use axum::http::StatusCode;
use serde_json::json;

use crate::store::{MockReportStore, SourceMessage};
use crate::tests::fixtures::*;
use crate::tests::helpers::{get_json, test_app};

fn thread() -> Vec<SourceMessage> {
    let mut failed = semclick_message("101", "42", Some(march(4, 12, 5)), "bot", "Olá! Como posso ajudar?");
    failed.delivered = Some(false);
    failed.error_reason = Some("número inválido".into());

    let mut empty = semclick_message("102", "42", Some(march(4, 12, 6)), "bot", "");
    empty.msg_tipo = None;
    empty.msg_conteudo = None;

    vec![
        legacy_message("abc", "42", Some(march(4, 12, 0)), Some(true), "Oi"),
        semclick_message("100", "42", Some(march(4, 12, 0)), "Cliente", "Oi"),
        failed,
        legacy_message("def", "42", Some(march(4, 12, 3)), Some(true), "Quero um orçamento"),
        legacy_message("ghi", "42", None, Some(true), "sem data"),
        empty,
    ]
}

fn store_with_thread() -> MockReportStore {
    let mut store = MockReportStore::new();
    store
        .expect_chat_messages()
        .withf(|chat_id| chat_id == "42")
        .returning(|_| Ok(thread()));
    store
}

#[tokio::test]
async fn missing_chat_id_is_a_bad_request() {
    // no expectations: touching the store would panic
    let (status, body) = get_json(test_app(MockReportStore::new()), "/api/messages/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "chat_id_required"}));
}

#[tokio::test]
async fn empty_chat_id_is_a_bad_request() {
    let (status, body) = get_json(test_app(MockReportStore::new()), "/api/messages?chat_id=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "chat_id_required"}));
}

#[tokio::test]
async fn thread_is_deduplicated_and_ordered() {
    let (status, body) = get_json(test_app(store_with_thread()), "/api/messages/?chat_id=42").await;
    assert_eq!(status, StatusCode::OK);

    let messages = body["messages"].as_array().unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["100", "def", "101", "ghi"]);

    assert_eq!(messages[0]["msg_from_client"], json!(true));
    assert_eq!(messages[0]["msg_status_envio"], json!(null));
    assert_eq!(messages[2]["msg_from_client"], json!(false));
    assert_eq!(messages[2]["msg_status_envio"], json!("número inválido"));
    assert_eq!(messages[3]["evento_timestamp"], json!(null));
}

#[tokio::test]
async fn limit_and_offset_window_the_thread() {
    let (status, body) = get_json(
        test_app(store_with_thread()),
        "/api/messages/?chat_id=42&limit=2&offset=1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["def", "101"]);
}

#[tokio::test]
async fn malformed_limit_is_reported_as_error_body() {
    let (status, body) = get_json(
        test_app(MockReportStore::new()),
        "/api/messages/?chat_id=42&limit=dez",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn database_failure_is_reported_as_error_body() {
    let mut store = MockReportStore::new();
    store
        .expect_chat_messages()
        .returning(|_| Err(sqlx::Error::PoolTimedOut));

    let (status, body) = get_json(test_app(store), "/api/messages/?chat_id=42").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty());
}
