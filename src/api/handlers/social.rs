//! Social handlers: friend requests, leaderboard and challenges.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{AcceptFriendBody, CreateChallengeRequest, FriendRequestBody, LeaderboardParams};
use crate::app_state::AppState;
use crate::domain::challenge::Challenge;
use crate::domain::social::Friendship;
use crate::domain::{ChallengeId, UserId};
use crate::error::{ErrorResponse, ProgressiaError};
use crate::service::gamification_service::{LeaderboardQuery, LeaderboardView};
use crate::service::social_service::ChallengeView;

/// `POST /friends`: Send a friend request.
///
/// # Errors
///
/// Returns [`ProgressiaError::InvalidRequest`] for a self request,
/// [`ProgressiaError::Conflict`] for a duplicate or not-found errors.
#[utoipa::path(
    post,
    path = "/api/v1/friends",
    tag = "Social",
    summary = "Send a friend request",
    request_body = FriendRequestBody,
    responses(
        (status = 201, description = "Pending request", body = Friendship),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Already requested", body = ErrorResponse),
    )
)]
pub async fn request_friend(
    State(state): State<AppState>,
    Json(req): Json<FriendRequestBody>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let edge = state
        .social
        .request_friend(req.requester_id, req.addressee_id, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// `POST /friends/accept`: Accept a pending request.
///
/// # Errors
///
/// Returns [`ProgressiaError::FriendshipNotFound`] or
/// [`ProgressiaError::Conflict`] when already accepted.
#[utoipa::path(
    post,
    path = "/api/v1/friends/accept",
    tag = "Social",
    summary = "Accept a friend request",
    request_body = AcceptFriendBody,
    responses(
        (status = 200, description = "Accepted friendship", body = Friendship),
        (status = 404, description = "No pending request", body = ErrorResponse),
        (status = 409, description = "Already accepted", body = ErrorResponse),
    )
)]
pub async fn accept_friend(
    State(state): State<AppState>,
    Json(req): Json<AcceptFriendBody>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let edge = state
        .social
        .accept_friend(req.addressee_id, req.requester_id)
        .await?;
    Ok(Json(edge))
}

/// `GET /leaderboard`: Current week standings.
///
/// # Errors
///
/// Returns [`ProgressiaError::InvalidRequest`] for `friends_only` without a
/// viewer or [`ProgressiaError::UserNotFound`] for an unknown viewer.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    tag = "Social",
    summary = "Weekly leaderboard",
    params(LeaderboardParams),
    responses(
        (status = 200, description = "Ranked standings", body = LeaderboardView),
        (status = 400, description = "Invalid filters", body = ErrorResponse),
        (status = 404, description = "Viewer not found", body = ErrorResponse),
    )
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let query = LeaderboardQuery {
        league: params.league,
        user_id: params.user_id.map(UserId::from_uuid),
        friends_only: params.friends_only,
        limit: params.limit,
    };
    let view = state.gamification.leaderboard(query, Utc::now()).await?;
    Ok(Json(view))
}

/// `POST /challenges`: Start a challenge with friends.
///
/// # Errors
///
/// Returns [`ProgressiaError::InvalidRequest`], [`ProgressiaError::NotFriends`]
/// or [`ProgressiaError::UserNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/challenges",
    tag = "Challenges",
    summary = "Create a challenge",
    request_body = CreateChallengeRequest,
    responses(
        (status = 201, description = "Active challenge", body = Challenge),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Invitee is not a friend", body = ErrorResponse),
    )
)]
pub async fn create_challenge(
    State(state): State<AppState>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let challenge = state
        .social
        .create_challenge(req.into(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

/// `GET /challenges/{id}`: Challenge with live standings.
///
/// # Errors
///
/// Returns [`ProgressiaError::ChallengeNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/challenges/{id}",
    tag = "Challenges",
    summary = "Get challenge",
    params(
        ("id" = uuid::Uuid, Path, description = "Challenge UUID"),
    ),
    responses(
        (status = 200, description = "Challenge and standings", body = ChallengeView),
        (status = 404, description = "Challenge not found", body = ErrorResponse),
    )
)]
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let view = state
        .social
        .challenge_standings(ChallengeId::from_uuid(id))
        .await?;
    Ok(Json(view))
}

/// `POST /challenges/{id}/resolve`: Resolve a due challenge now.
///
/// # Errors
///
/// Returns [`ProgressiaError::Conflict`] while still running,
/// [`ProgressiaError::ChallengeClosed`] when already resolved, or
/// [`ProgressiaError::ChallengeNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/challenges/{id}/resolve",
    tag = "Challenges",
    summary = "Resolve a challenge",
    description = "Resolves the challenge if its window ended or someone reached the goal; winners get CHALLENGE_WIN, everyone else CHALLENGE_PARTICIPATE.",
    params(
        ("id" = uuid::Uuid, Path, description = "Challenge UUID"),
    ),
    responses(
        (status = 200, description = "Resolved challenge", body = ChallengeView),
        (status = 404, description = "Challenge not found", body = ErrorResponse),
        (status = 409, description = "Still running or already resolved", body = ErrorResponse),
    )
)]
pub async fn resolve_challenge(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ProgressiaError> {
    let view = state
        .social
        .resolve_challenge(ChallengeId::from_uuid(id), Utc::now())
        .await?;
    Ok(Json(view))
}

/// Social and challenge routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/friends", post(request_friend))
        .route("/friends/accept", post(accept_friend))
        .route("/leaderboard", get(leaderboard))
        .route("/challenges", post(create_challenge))
        .route("/challenges/{id}", get(get_challenge))
        .route("/challenges/{id}/resolve", post(resolve_challenge))
}
