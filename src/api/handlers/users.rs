//! User handlers: registration, profile, plan, XP, badges and progress.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    AwardXpRequest, CreateUserRequest, PaginationParams, SetPlanRequest, XpEventListResponse,
};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::domain::user::Profile;
use crate::error::{ErrorResponse, ProgressiaError};
use crate::service::AwardRequest;
use crate::service::gamification_service::{EarnedBadge, ProfileSummary};
use crate::service::learning_service::ProgressView;
use crate::service::social_service::FriendView;

/// Longest accepted idempotency key.
const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// `POST /users`: Register a learner.
///
/// # Errors
///
/// Returns [`ProgressiaError::InvalidRequest`] for a bad name or goal.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Register a learner",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = Profile),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let profile = state
        .gamification
        .create_user(&req.display_name, req.plan, req.daily_goal_xp, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /users/{id}`: Profile with totals, streak, league and badges.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Get profile summary",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Profile summary", body = ProfileSummary),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let summary = state
        .gamification
        .profile(UserId::from_uuid(id), Utc::now())
        .await?;
    Ok(Json(summary))
}

/// `PUT /users/{id}/plan`: Switch between FREE and PREMIUM.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/plan",
    tag = "Users",
    summary = "Change plan",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = SetPlanRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn set_plan(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SetPlanRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let profile = state
        .gamification
        .set_plan(UserId::from_uuid(id), req.plan)
        .await?;
    Ok(Json(profile))
}

/// `POST /users/{id}/xp`: Award XP directly.
///
/// # Errors
///
/// Returns [`ProgressiaError::InvalidRequest`] for a bad amount or key,
/// [`ProgressiaError::UserNotFound`] or [`ProgressiaError::RateLimited`].
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/xp",
    tag = "Users",
    summary = "Award XP",
    description = "Appends an XP event and updates the weekly league. A repeated `idempotency_key` awards nothing and reports `duplicate: true`.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = AwardXpRequest,
    responses(
        (status = 200, description = "Award outcome", body = crate::service::AwardOutcome),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn award_xp(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AwardXpRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    if req
        .idempotency_key
        .as_ref()
        .is_some_and(|k| k.is_empty() || k.len() > MAX_IDEMPOTENCY_KEY_LEN)
    {
        return Err(ProgressiaError::InvalidRequest(format!(
            "idempotency_key debe tener entre 1 y {MAX_IDEMPOTENCY_KEY_LEN} caracteres"
        )));
    }
    let now = Utc::now();
    state.rate_limiter.check(&format!("{id}:xp"), now).await?;
    let request = AwardRequest {
        event_type: req.event_type,
        amount: req.amount,
        metadata: req.metadata,
        idempotency_key: req.idempotency_key,
    };
    let outcome = state
        .gamification
        .award_xp(UserId::from_uuid(id), request, now)
        .await?;
    Ok(Json(outcome))
}

/// `GET /users/{id}/xp-events`: XP history, newest first.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/xp-events",
    tag = "Users",
    summary = "XP history",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Paginated XP events", body = XpEventListResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_xp_events(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let events = state.gamification.xp_events(UserId::from_uuid(id)).await?;
    let (data, pagination) = params.paginate(events);
    Ok(Json(XpEventListResponse { data, pagination }))
}

/// `GET /users/{id}/badges`: Earned badges.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/badges",
    tag = "Users",
    summary = "Earned badges",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Badges", body = Vec<EarnedBadge>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_badges(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let badges = state.gamification.badges(UserId::from_uuid(id)).await?;
    Ok(Json(badges))
}

/// `GET /users/{id}/progress`: Course completion by level and unit.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/progress",
    tag = "Users",
    summary = "Course progress",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Progress", body = ProgressView),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let progress = state.learning.progress(UserId::from_uuid(id)).await?;
    Ok(Json(progress))
}

/// `GET /users/{id}/friends`: Friends and pending requests.
///
/// # Errors
///
/// Returns [`ProgressiaError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/friends",
    tag = "Social",
    summary = "List friends",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Friends", body = Vec<FriendView>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_friends(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let friends = state.social.friends(UserId::from_uuid(id)).await?;
    Ok(Json(friends))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/plan", put(set_plan))
        .route("/users/{id}/xp", post(award_xp))
        .route("/users/{id}/xp-events", get(list_xp_events))
        .route("/users/{id}/badges", get(list_badges))
        .route("/users/{id}/progress", get(get_progress))
        .route("/users/{id}/friends", get(list_friends))
}
