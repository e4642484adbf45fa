// Integration tests for /api/events/

use axum::http::StatusCode;
use serde_json::json;

use crate::handlers::events::EVENTS_LIMIT;
use crate::store::MockReportStore;
use crate::tests::fixtures::raw_event;
use crate::tests::helpers::{get_json, test_app};

#[tokio::test]
async fn events_carry_inferred_direction() {
    let mut store = MockReportStore::new();
    store
        .expect_recent_events()
        .withf(|limit| *limit == EVENTS_LIMIT)
        .returning(|_| {
            let mut failed = raw_event(2, "Enviada");
            failed.msg_delivered = Some(false);
            failed.msg_erro_motivo = Some("bloqueado".into());
            Ok(vec![raw_event(3, "inbound"), failed, raw_event(1, "nota interna")])
        });

    let (status, body) = get_json(test_app(store), "/api/events/").await;
    assert_eq!(status, StatusCode::OK);

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    // ids keep their column type
    assert_eq!(events[0]["id"], json!(3));
    assert_eq!(events[0]["msg_from_client"], json!(true));
    assert_eq!(events[1]["msg_from_client"], json!(false));
    assert_eq!(events[1]["msg_status_envio"], json!("bloqueado"));
    assert_eq!(events[1]["msg_direcao"], json!("Enviada"));
    assert_eq!(events[2]["msg_from_client"], json!(null));
}

#[tokio::test]
async fn database_failure_is_reported_as_error_body() {
    let mut store = MockReportStore::new();
    store
        .expect_recent_events()
        .returning(|_| Err(sqlx::Error::RowNotFound));

    let (status, body) = get_json(test_app(store), "/api/events").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!(sqlx::Error::RowNotFound.to_string()));
}
