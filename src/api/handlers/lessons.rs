//! Lesson handlers: catalog, completion and quizzes.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{CompleteLessonRequest, LessonDetailDto, LessonSummaryDto, SubmitQuizRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ProgressiaError};
use crate::service::learning_service::{LessonCompletion, QuizResult};

/// `GET /lessons`: Every lesson in catalog order.
#[utoipa::path(
    get,
    path = "/api/v1/lessons",
    tag = "Lessons",
    summary = "List lessons",
    responses(
        (status = 200, description = "Lessons in unlock order", body = Vec<LessonSummaryDto>),
    )
)]
pub async fn list_lessons(State(state): State<AppState>) -> impl IntoResponse {
    let lessons: Vec<LessonSummaryDto> = state
        .learning
        .catalog()
        .lessons()
        .map(LessonSummaryDto::from)
        .collect();
    Json(lessons)
}

/// `GET /lessons/{id}`: Lesson content with its quiz (answers hidden).
///
/// # Errors
///
/// Returns [`ProgressiaError::LessonNotFound`] for unknown slugs.
#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}",
    tag = "Lessons",
    summary = "Get lesson",
    params(
        ("id" = String, Path, description = "Lesson slug"),
    ),
    responses(
        (status = 200, description = "Lesson detail", body = LessonDetailDto),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    )
)]
pub async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let found = state
        .learning
        .catalog()
        .lesson(&id)
        .ok_or_else(|| ProgressiaError::LessonNotFound(id.clone()))?;
    Ok(Json(LessonDetailDto::from(found)))
}

/// `POST /lessons/{id}/complete`: Complete a lesson.
///
/// # Errors
///
/// Returns [`ProgressiaError::LessonLocked`], [`ProgressiaError::PremiumRequired`],
/// not-found errors or [`ProgressiaError::RateLimited`].
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/complete",
    tag = "Lessons",
    summary = "Complete a lesson",
    description = "Awards the lesson XP (plus unit and level bonuses on first completion), updates the streak, checks the daily goal and badges.",
    params(
        ("id" = String, Path, description = "Lesson slug"),
    ),
    request_body = CompleteLessonRequest,
    responses(
        (status = 200, description = "Completion outcome", body = LessonCompletion),
        (status = 403, description = "Premium required", body = ErrorResponse),
        (status = 404, description = "Lesson or user not found", body = ErrorResponse),
        (status = 422, description = "Lesson locked", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn complete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CompleteLessonRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let now = Utc::now();
    state
        .rate_limiter
        .check(&format!("{}:lesson", req.user_id), now)
        .await?;
    let completion = state.learning.complete_lesson(req.user_id, &id, now).await?;
    Ok(Json(completion))
}

/// `POST /lessons/{id}/quiz`: Submit quiz answers.
///
/// # Errors
///
/// Same as [`complete_lesson`], plus [`ProgressiaError::InvalidRequest`]
/// for malformed answers.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/quiz",
    tag = "Lessons",
    summary = "Submit a quiz",
    params(
        ("id" = String, Path, description = "Lesson slug"),
    ),
    request_body = SubmitQuizRequest,
    responses(
        (status = 200, description = "Graded quiz", body = QuizResult),
        (status = 400, description = "Malformed answers", body = ErrorResponse),
        (status = 403, description = "Premium required", body = ErrorResponse),
        (status = 404, description = "Lesson or user not found", body = ErrorResponse),
        (status = 422, description = "Lesson locked", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let now = Utc::now();
    state
        .rate_limiter
        .check(&format!("{}:quiz", req.user_id), now)
        .await?;
    let result = state
        .learning
        .submit_quiz(req.user_id, &id, &req.answers, now)
        .await?;
    Ok(Json(result))
}

/// Lesson routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lessons", get(list_lessons))
        .route("/lessons/{id}", get(get_lesson))
        .route("/lessons/{id}/complete", post(complete_lesson))
        .route("/lessons/{id}/quiz", post(submit_quiz))
}
