use axum::http::StatusCode;
use serde_json::json;

use crate::store::MockReportStore;
use crate::tests::helpers::{get_json, test_app};

#[tokio::test]
async fn healthy_when_database_answers() {
    let mut store = MockReportStore::new();
    store.expect_ping().returning(|| true);

    let (status, body) = get_json(test_app(store), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["database"], json!("connected"));
}

#[tokio::test]
async fn unavailable_when_database_is_down() {
    let mut store = MockReportStore::new();
    store.expect_ping().returning(|| false);

    let (status, body) = get_json(test_app(store), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("unhealthy"));
}
