use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::handlers::ApiError;
use crate::services::AppState;

/// Claims of a contest token: the bearer may author the question bank of
/// `contest_id` until `exp`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContestClaims {
    #[serde(rename = "contestId")]
    pub contest_id: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Authorization header missing or invalid.")]
    MissingToken,
    #[error("Failed to sign token")]
    SigningFailed,
}

#[derive(Clone)]
pub struct ContestTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl ContestTokenService {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn issue(&self, contest_id: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        self.sign(&ContestClaims {
            contest_id: contest_id.to_string(),
            exp: now.saturating_add(self.ttl_seconds),
            iat: now,
        })
    }

    fn sign(&self, claims: &ContestClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Contest token signing failed: {}", e);
            AuthError::SigningFailed
        })
    }

    pub fn verify(&self, token: &str) -> Result<ContestClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let claims = decode::<ContestClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        if claims.contest_id.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies `Authorization: Bearer <contest token>` and stores the claims in
/// the request extensions for the question bank handlers.
pub async fn contest_token_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        tracing::warn!("Contest token missing on {}", request.uri().path());
        return ApiError::from(AuthError::MissingToken).into_response();
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Contest token rejected: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    tracing::debug!("Contest token accepted for contest_id={}", claims.contest_id);
    request.extensions_mut().insert(claims);

    next.run(request).await
}
