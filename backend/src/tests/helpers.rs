use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Once};
use tower::ServiceExt;

use crate::reporting::ReportRules;
use crate::store::MockReportStore;
use crate::{app, AppState};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// Full router over a mocked store with the default rule set.
pub fn test_app(store: MockReportStore) -> Router {
    init_test_logging();
    app(Arc::new(AppState {
        store: Arc::new(store),
        rules: ReportRules::default(),
    }))
}

/// GET `uri` and decode the JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("{uri} returned non-JSON body ({e}): {bytes:?}"));
    (status, body)
}
