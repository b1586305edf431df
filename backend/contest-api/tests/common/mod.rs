#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use contest_portal_api::{
    config::Config,
    create_router,
    delivery::{DeliverySink, MemoryDeliverySink},
    error::DeliveryError,
    models::SelectedProblemSet,
    services::AppState,
    store::MemoryStore,
};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config::for_memory(TEST_SECRET)
}

/// Sink whose judge side is unreachable: every call fails.
pub struct UnreachableSink;

fn unreachable() -> DeliveryError {
    DeliveryError::Serialize(serde_json::from_str::<Value>("{").unwrap_err())
}

#[async_trait]
impl DeliverySink for UnreachableSink {
    async fn deliver(&self, _problem_set: &SelectedProblemSet) -> Result<(), DeliveryError> {
        Err(unreachable())
    }
    async fn fetch(&self, _contest_id: &str) -> Result<Option<SelectedProblemSet>, DeliveryError> {
        Err(unreachable())
    }
    async fn discard(&self, _contest_id: &str) -> Result<(), DeliveryError> {
        Err(unreachable())
    }
    async fn ping(&self) -> Result<(), DeliveryError> {
        Err(unreachable())
    }
}

pub fn create_test_app() -> Router {
    create_test_app_with(Arc::new(MemoryDeliverySink::new()))
}

/// Router over a fresh in-memory store and the given delivery sink.
pub fn create_test_app_with(delivery: Arc<dyn DeliverySink>) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::new(
        test_config(),
        Arc::new(MemoryStore::new()),
        delivery,
    ));
    create_router(app_state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn create_contest(app: &Router, contest_id: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/contests",
        Some(serde_json::json!({
            "contest_id": contest_id,
            "contest_name": format!("Contest {}", contest_id),
            "start_time": "2026-03-01T09:00",
            "end_time": "2026-03-01T12:00",
            "organization_type": "college",
            "organization_name": "SNS",
            "ContestType": "coding"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create contest failed: {}", body);
}

pub async fn contest_token(app: &Router, contest_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/mcq/token",
        Some(serde_json::json!({ "contestId": contest_id })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "token issue failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}
