//! Question bank authoring. Everything except token issue sits behind
//! `contest_token_middleware`; the contest comes from the token, never the body.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use crate::error::ServiceError;
use crate::extractors::{AppJson, ValidJson};
use crate::middlewares::auth::ContestClaims;
use crate::models::{
    ImportRow, IssueTokenRequest, PublishRequest, Question, QuestionsPayload,
    SaveAssessmentRequest, TokenResponse,
};
use crate::services::{
    question_service::{questions_from_rows, QuestionService},
    AppState,
};

pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<IssueTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contest_id = req.contest_id.trim();
    if contest_id.is_empty() {
        return Err(ServiceError::invalid_input("Contest ID is required").into());
    }
    let token = state.tokens.issue(contest_id)?;
    tracing::info!("Contest token issued for contest_id={}", contest_id);
    Ok(Json(TokenResponse { token }))
}

pub async fn save_assessment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
    AppJson(req): AppJson<SaveAssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    QuestionService::new(state.store.clone())
        .save_assessment(&claims.contest_id, req)
        .await?;
    Ok(Json(json!({
        "message": "Data saved successfully",
        "contestId": claims.contest_id,
    })))
}

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let questions = QuestionService::new(state.store.clone())
        .list_questions(&claims.contest_id)
        .await?;
    Ok(Json(QuestionsPayload { questions }))
}

pub async fn append_questions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
    AppJson(req): AppJson<QuestionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let added = QuestionService::new(state.store.clone())
        .append_questions(&claims.contest_id, req.questions)
        .await?;
    Ok(Json(json!({
        "message": "Questions saved successfully!",
        "added_questions": added,
    })))
}

pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
    AppJson(question): AppJson<Question>,
) -> Result<impl IntoResponse, ApiError> {
    QuestionService::new(state.store.clone())
        .update_question(&claims.contest_id, question)
        .await?;
    Ok(Json(json!({ "message": "Question updated successfully" })))
}

pub async fn replace_questions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
    AppJson(req): AppJson<QuestionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    QuestionService::new(state.store.clone())
        .replace_questions(&claims.contest_id, req.questions)
        .await?;
    Ok(Json(json!({ "message": "Contest finished successfully!" })))
}

/// Converts sheet rows to questions and hands them back for review; the
/// client appends the ones it keeps.
pub async fn import_questions(
    Extension(claims): Extension<ContestClaims>,
    AppJson(rows): AppJson<Vec<ImportRow>>,
) -> Result<impl IntoResponse, ApiError> {
    let questions = questions_from_rows(&rows)?;
    tracing::info!(
        "Imported {} rows for contest_id={}",
        questions.len(),
        claims.contest_id
    );
    Ok(Json(QuestionsPayload { questions }))
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<ContestClaims>,
    AppJson(req): AppJson<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    QuestionService::new(state.store.clone())
        .publish(&claims.contest_id, req.students)
        .await?;
    Ok(Json(json!({ "message": "Students added to the assessment" })))
}
