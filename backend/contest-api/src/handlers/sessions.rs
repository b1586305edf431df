use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use crate::extractors::ValidJson;
use crate::models::{FinishSessionRequest, StartSessionRequest};
use crate::services::{
    problem_service::ProblemService, session_service::SessionService, AppState,
};

/// Starts a coding test: marks the session started and delivers a fresh
/// problem set, which is also returned to the caller.
pub async fn start_coding_test(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<StartSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Starting coding test for contest_id={}, student_id={}",
        req.contest_id,
        req.student_id
    );

    let problem_set = ProblemService::new(state.store.clone(), state.delivery.clone())
        .start_coding_test(&req.contest_id, &req.student_id)
        .await?;

    Ok(Json(json!({
        "message": "Test started",
        "problems": problem_set.problems,
    })))
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<StartSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    SessionService::new(state.store.clone())
        .start_session(&req.contest_id, &req.student_id)
        .await?;
    Ok(Json(json!({ "message": "Test started" })))
}

pub async fn finish_session(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<FinishSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    SessionService::new(state.store.clone())
        .finish_session(&req.contest_id, &req.student_id, req.payload)
        .await?;
    Ok(Json(json!({ "message": "Test completed" })))
}
