//! Friendship and challenge DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::UserId;
use crate::domain::challenge::{ChallengeKind, NewChallenge};

/// Request body for `POST /friends`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FriendRequestBody {
    /// Who sends the request.
    pub requester_id: UserId,
    /// Who receives it.
    pub addressee_id: UserId,
}

/// Request body for `POST /friends/accept`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptFriendBody {
    /// Who received the request and accepts it.
    pub addressee_id: UserId,
    /// Who sent it.
    pub requester_id: UserId,
}

/// Request body for `POST /challenges`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChallengeRequest {
    /// `DUEL` or `GROUP`.
    pub kind: ChallengeKind,
    /// Title (1-100 chars).
    pub title: String,
    /// Creator.
    pub creator_id: UserId,
    /// Accepted friends to invite.
    pub invitee_ids: Vec<UserId>,
    /// XP target that ends the challenge early.
    #[serde(default)]
    pub goal_xp: Option<u64>,
    /// Window length in days (1-30). Defaults to 7.
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
}

fn default_duration_days() -> u32 {
    7
}

impl From<CreateChallengeRequest> for NewChallenge {
    fn from(req: CreateChallengeRequest) -> Self {
        Self {
            kind: req.kind,
            title: req.title,
            creator: req.creator_id,
            invitees: req.invitee_ids,
            goal_xp: req.goal_xp,
            duration_days: req.duration_days,
        }
    }
}
