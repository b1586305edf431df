use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ServiceError, StoreError};
use crate::metrics;
use crate::middlewares::auth::AuthError;
use crate::services::AppState;

/// Error response of every API handler: `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => ApiError::new(StatusCode::NOT_FOUND, message),
            ServiceError::Unauthorized(message) => {
                ApiError::new(StatusCode::UNAUTHORIZED, message)
            }
            ServiceError::InvalidInput(message) => ApiError::new(StatusCode::BAD_REQUEST, message),
            ServiceError::DeliveryFailure(cause) => {
                tracing::error!("Delivery failure: {}", cause);
                ApiError::new(StatusCode::BAD_GATEWAY, "Failed to deliver problem set")
            }
            // Only our own cascade messages are safe to echo; driver errors stay in the logs.
            ServiceError::StoreFailure(StoreError::Other(message)) => {
                tracing::error!("Store failure: {}", message);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            ServiceError::StoreFailure(cause) => {
                tracing::error!("Store failure: {}", cause);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SigningFailed => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            _ => ApiError::new(StatusCode::UNAUTHORIZED, err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = serde_json::Map::new();

    let store_health = match tokio::time::timeout(Duration::from_secs(1), state.store.ping()).await
    {
        Ok(Ok(())) => json!({ "status": "healthy" }),
        Ok(Err(e)) => json!({ "status": "unhealthy", "error": format!("Store error: {}", e) }),
        Err(_) => json!({ "status": "unhealthy", "error": "Store timeout after 1s" }),
    };
    let delivery_health =
        match tokio::time::timeout(Duration::from_millis(500), state.delivery.ping()).await {
            Ok(Ok(())) => json!({ "status": "healthy" }),
            Ok(Err(e)) => {
                json!({ "status": "unhealthy", "error": format!("Delivery error: {}", e) })
            }
            Err(_) => json!({ "status": "unhealthy", "error": "Delivery timeout after 500ms" }),
        };

    let all_healthy = store_health["status"] == "healthy" && delivery_health["status"] == "healthy";
    dependencies.insert("store".to_string(), store_health);
    dependencies.insert("delivery".to_string(), delivery_health);

    let (status_code, status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "contest-portal-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects /metrics with HTTP Basic Auth; credentials come from `metrics.basic_auth`.
pub async fn metrics_auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let credentials = basic_credentials(&headers).ok_or(StatusCode::UNAUTHORIZED)?;

    if credentials != state.config.metrics_basic_auth {
        tracing::warn!("Rejected /metrics request with wrong credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

fn basic_credentials(headers: &HeaderMap) -> Option<String> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(decoded).ok()
}

pub mod contests;
pub mod questions;
pub mod sessions;
