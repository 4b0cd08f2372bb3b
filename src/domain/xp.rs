//! XP events and the fixed reward table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Largest amount a single award may carry.
pub const MAX_AWARD: u32 = 10_000;

/// Kind of activity an XP award is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum XpEventType {
    /// A lesson was completed.
    LessonComplete,
    /// A lesson quiz was passed.
    QuizPass,
    /// A lesson quiz was answered without mistakes.
    QuizPerfect,
    /// Every lesson of a unit is complete.
    UnitComplete,
    /// Every unit of a level is complete.
    LevelComplete,
    /// The daily XP goal was reached.
    DailyGoal,
    /// A challenge was won.
    ChallengeWin,
    /// A challenge ended without a win for this user.
    ChallengeParticipate,
    /// A streak milestone was reached.
    StreakBonus,
}

impl XpEventType {
    /// Every event type, in reward-table order.
    pub const ALL: [Self; 9] = [
        Self::LessonComplete,
        Self::QuizPass,
        Self::QuizPerfect,
        Self::UnitComplete,
        Self::LevelComplete,
        Self::DailyGoal,
        Self::ChallengeWin,
        Self::ChallengeParticipate,
        Self::StreakBonus,
    ];

    /// Amount awarded when no explicit amount is given.
    #[must_use]
    pub const fn default_reward(self) -> u32 {
        match self {
            Self::LessonComplete => 10,
            Self::QuizPass => 15,
            Self::QuizPerfect => 25,
            Self::UnitComplete => 50,
            Self::LevelComplete => 100,
            Self::DailyGoal => 20,
            Self::ChallengeWin => 50,
            Self::ChallengeParticipate => 10,
            Self::StreakBonus => 25,
        }
    }

    /// Wire name, e.g. `"LESSON_COMPLETE"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LessonComplete => "LESSON_COMPLETE",
            Self::QuizPass => "QUIZ_PASS",
            Self::QuizPerfect => "QUIZ_PERFECT",
            Self::UnitComplete => "UNIT_COMPLETE",
            Self::LevelComplete => "LEVEL_COMPLETE",
            Self::DailyGoal => "DAILY_GOAL",
            Self::ChallengeWin => "CHALLENGE_WIN",
            Self::ChallengeParticipate => "CHALLENGE_PARTICIPATE",
            Self::StreakBonus => "STREAK_BONUS",
        }
    }

    /// Whether this award comes out of a challenge.
    #[must_use]
    pub const fn is_challenge_reward(self) -> bool {
        matches!(self, Self::ChallengeWin | Self::ChallengeParticipate)
    }
}

/// Resolves the amount for an award, validating explicit amounts.
///
/// Returns `None` for an explicit amount of zero or above [`MAX_AWARD`].
#[must_use]
pub fn resolve_amount(event_type: XpEventType, explicit: Option<u32>) -> Option<u32> {
    match explicit {
        None => Some(event_type.default_reward()),
        Some(amount) if (1..=MAX_AWARD).contains(&amount) => Some(amount),
        Some(_) => None,
    }
}

/// Immutable record of one XP award. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct XpEvent {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Recipient.
    pub user_id: UserId,
    /// Activity kind.
    #[serde(rename = "type")]
    pub event_type: XpEventType,
    /// XP awarded.
    pub amount: u32,
    /// Free-form context (lesson id, challenge id, ...).
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    /// Deduplication key, if the award carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Award timestamp.
    pub created_at: DateTime<Utc>,
}
