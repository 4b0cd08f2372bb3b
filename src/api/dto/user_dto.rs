//! User, XP and leaderboard DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::user::Plan;
use crate::domain::xp::XpEvent;
use crate::domain::{League, XpEventType};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Name shown on leaderboards (1-50 chars).
    pub display_name: String,
    /// Subscription plan. Defaults to `FREE`.
    #[serde(default)]
    pub plan: Plan,
    /// Daily XP goal; the server default applies when omitted.
    #[serde(default)]
    pub daily_goal_xp: Option<u32>,
}

/// Request body for `PUT /users/{id}/plan`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPlanRequest {
    /// New plan.
    pub plan: Plan,
}

/// Request body for `POST /users/{id}/xp`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AwardXpRequest {
    /// Activity kind.
    #[serde(rename = "type")]
    pub event_type: XpEventType,
    /// Explicit amount (1..=10000); the reward table applies when omitted.
    #[serde(default)]
    pub amount: Option<u32>,
    /// Free-form context stored with the event.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    /// Deduplication key (max 128 chars).
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Paginated XP history.
#[derive(Debug, Serialize, ToSchema)]
pub struct XpEventListResponse {
    /// Events, newest first.
    pub data: Vec<XpEvent>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Query parameters for `GET /leaderboard`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardParams {
    /// Only this tier.
    #[serde(default)]
    pub league: Option<League>,
    /// Viewer; required with `friends_only`.
    #[serde(default)]
    pub user_id: Option<uuid::Uuid>,
    /// Restrict to the viewer and accepted friends.
    #[serde(default)]
    pub friends_only: bool,
    /// Maximum rows (1..=100). Defaults to 20.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}
