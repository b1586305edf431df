use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::ApiError;
use crate::extractors::{AppJson, ValidJson};
use crate::models::{
    CreateContestRequest, CreateStudentRequest, RegisterStudentRequest,
    SaveCodingAssessmentRequest,
};
use crate::services::{
    contest_service::ContestService, problem_service::ProblemService,
    question_service::QuestionService, session_service::SessionService,
    stats_service::StatsService, AppState,
};

fn contest_service(state: &AppState) -> ContestService {
    ContestService::new(state.store.clone(), state.delivery.clone())
}

pub async fn list_contests(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let contests = contest_service(&state).list().await?;
    Ok(Json(contests))
}

pub async fn create_contest(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateContestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Creating contest: {}", req.contest_id);
    let contest = contest_service(&state).create(req).await?;
    Ok((StatusCode::CREATED, Json(contest)))
}

pub async fn get_contest(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let contest = contest_service(&state).get(&contest_id).await?;
    Ok(Json(contest))
}

pub async fn delete_contest(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Deleting contest: {}", contest_id);
    let outcome = contest_service(&state).delete(&contest_id).await?;
    Ok(Json(outcome))
}

pub async fn contest_stats(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = StatsService::new(state.store.clone())
        .contest_stats(&contest_id)
        .await?;
    Ok(Json(stats))
}

pub async fn contest_students(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let students = contest_service(&state).contest_students(&contest_id).await?;
    Ok(Json(json!({ "students": students })))
}

pub async fn register_student(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
    ValidJson(req): ValidJson<RegisterStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = contest_service(&state).register(&contest_id, req).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn create_student(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = contest_service(&state).create_student(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn save_coding_assessment(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
    AppJson(req): AppJson<SaveCodingAssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assessment = ProblemService::new(state.store.clone(), state.delivery.clone())
        .save_coding_assessment(&contest_id, req)
        .await?;
    Ok(Json(assessment))
}

pub async fn problem_set(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let set = ProblemService::new(state.store.clone(), state.delivery.clone())
        .fetch_problem_set(&contest_id)
        .await?;
    Ok(Json(set))
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Path((contest_id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let status = SessionService::new(state.store.clone())
        .get_status(&contest_id, &student_id)
        .await?;
    Ok(Json(status))
}

/// Student-facing MCQ paper: shuffled per the saved configuration, no answers.
pub async fn present_assessment(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = QuestionService::new(state.store.clone())
        .present_assessment(&contest_id)
        .await?;
    Ok(Json(presented))
}
