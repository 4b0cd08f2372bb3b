//! System endpoints: health check and the reward catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::badge::BadgeCode;
use crate::domain::streak::STREAK_BONUSES;
use crate::domain::{League, XpEventType};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    users: usize,
    ws_clients: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and a few gauges.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            users: state.gamification.store().user_count().await,
            ws_clients: state.event_bus.receiver_count(),
        }),
    )
}

/// Default XP of one activity kind.
#[derive(Debug, Serialize, ToSchema)]
pub struct RewardInfo {
    #[serde(rename = "type")]
    event_type: XpEventType,
    xp: u32,
}

/// Weekly threshold of one league.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeagueInfo {
    league: League,
    min_weekly_xp: u64,
}

/// Catalog entry of one badge.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeInfo {
    code: BadgeCode,
    name: &'static str,
    description: &'static str,
}

/// Streak milestone bonus.
#[derive(Debug, Serialize, ToSchema)]
pub struct StreakBonusInfo {
    days: u32,
    xp: u32,
}

/// Everything a client needs to explain the rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct RewardsConfig {
    rewards: Vec<RewardInfo>,
    leagues: Vec<LeagueInfo>,
    badges: Vec<BadgeInfo>,
    streak_bonuses: Vec<StreakBonusInfo>,
    quiz_pass_percent: u32,
    default_daily_goal_xp: u32,
    utc_offset_minutes: i32,
}

/// `GET /config/rewards`: Reward table, league thresholds and badges.
#[utoipa::path(
    get,
    path = "/config/rewards",
    tag = "System",
    summary = "Game rules",
    description = "Returns the default XP per activity, league thresholds, the badge catalog, streak bonuses and tuning values.",
    responses(
        (status = 200, description = "Rule catalog", body = RewardsConfig),
    )
)]
pub async fn rewards_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rules = state.gamification.rules();
    let config = RewardsConfig {
        rewards: XpEventType::ALL
            .into_iter()
            .map(|event_type| RewardInfo {
                event_type,
                xp: event_type.default_reward(),
            })
            .collect(),
        leagues: League::DESCENDING
            .into_iter()
            .rev()
            .map(|league| LeagueInfo {
                league,
                min_weekly_xp: league.min_xp(),
            })
            .collect(),
        badges: BadgeCode::ALL
            .into_iter()
            .map(|code| BadgeInfo {
                code,
                name: code.name(),
                description: code.description(),
            })
            .collect(),
        streak_bonuses: STREAK_BONUSES
            .into_iter()
            .map(|(days, xp)| StreakBonusInfo { days, xp })
            .collect(),
        quiz_pass_percent: rules.quiz_pass_percent,
        default_daily_goal_xp: rules.default_daily_goal_xp,
        utc_offset_minutes: rules.calendar.offset().local_minus_utc() / 60,
    };
    (StatusCode::OK, Json(config))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/rewards", get(rewards_handler))
}
