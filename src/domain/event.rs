//! Domain events reflecting gamification state changes.
//!
//! Every mutation emits one or more [`GamificationEvent`]s through the
//! [`super::EventBus`]. Events are pushed to WebSocket subscribers and,
//! when persistence is enabled, appended to the PostgreSQL journal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::badge::BadgeCode;
use super::league::League;
use super::streak::StreakTransition;
use super::xp::XpEventType;
use super::{ChallengeId, UserId};

/// Domain event emitted after a state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GamificationEvent {
    /// XP was appended to a user's log.
    XpAwarded {
        /// Recipient.
        user_id: UserId,
        /// XP event identifier.
        xp_event_id: uuid::Uuid,
        /// Activity kind.
        kind: XpEventType,
        /// XP awarded.
        amount: u32,
        /// Lifetime total after the award.
        total_xp: u64,
        /// Weekly XP after the award.
        weekly_xp: u64,
        /// Award timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A weekly league entry moved to another tier.
    LeagueChanged {
        /// Participant.
        user_id: UserId,
        /// Local Monday of the week.
        week_start: NaiveDate,
        /// Tier before.
        from: League,
        /// Tier after.
        to: League,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A qualifying activity touched the streak.
    StreakUpdated {
        /// Learner.
        user_id: UserId,
        /// What happened.
        transition: StreakTransition,
        /// Current streak after the update.
        current_streak: u32,
        /// Longest streak after the update.
        longest_streak: u32,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A badge was earned.
    BadgeEarned {
        /// Learner.
        user_id: UserId,
        /// Badge.
        badge: BadgeCode,
        /// Award timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A lesson was completed for the first time.
    LessonCompleted {
        /// Learner.
        user_id: UserId,
        /// Lesson slug.
        lesson_id: String,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A challenge was resolved.
    ChallengeCompleted {
        /// Challenge.
        challenge_id: ChallengeId,
        /// Everyone who took part.
        participants: Vec<UserId>,
        /// Who won (possibly empty).
        winners: Vec<UserId>,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl GamificationEvent {
    /// Users this event concerns.
    #[must_use]
    pub fn user_ids(&self) -> Vec<UserId> {
        match self {
            Self::XpAwarded { user_id, .. }
            | Self::LeagueChanged { user_id, .. }
            | Self::StreakUpdated { user_id, .. }
            | Self::BadgeEarned { user_id, .. }
            | Self::LessonCompleted { user_id, .. } => vec![*user_id],
            Self::ChallengeCompleted { participants, .. } => participants.clone(),
        }
    }

    /// Primary entity the event is about: the user, or the challenge.
    #[must_use]
    pub fn subject_id(&self) -> uuid::Uuid {
        match self {
            Self::XpAwarded { user_id, .. }
            | Self::LeagueChanged { user_id, .. }
            | Self::StreakUpdated { user_id, .. }
            | Self::BadgeEarned { user_id, .. }
            | Self::LessonCompleted { user_id, .. } => *user_id.as_uuid(),
            Self::ChallengeCompleted { challenge_id, .. } => *challenge_id.as_uuid(),
        }
    }

    /// When the event happened.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::XpAwarded { timestamp, .. }
            | Self::LeagueChanged { timestamp, .. }
            | Self::StreakUpdated { timestamp, .. }
            | Self::BadgeEarned { timestamp, .. }
            | Self::LessonCompleted { timestamp, .. }
            | Self::ChallengeCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::XpAwarded { .. } => "xp_awarded",
            Self::LeagueChanged { .. } => "league_changed",
            Self::StreakUpdated { .. } => "streak_updated",
            Self::BadgeEarned { .. } => "badge_earned",
            Self::LessonCompleted { .. } => "lesson_completed",
            Self::ChallengeCompleted { .. } => "challenge_completed",
        }
    }
}
