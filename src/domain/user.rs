//! Learner profile and the per-user aggregate guarded by one lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::badge::{BadgeCode, BadgeStats};
use super::streak::Streak;
use super::xp::{XpEvent, XpEventType};
use super::UserId;

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    /// Free tier: premium lessons are locked.
    #[default]
    Free,
    /// Paid tier.
    Premium,
}

/// Public profile data.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Profile {
    /// User identifier.
    pub id: UserId,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// Subscription plan.
    pub plan: Plan,
    /// XP per local day that triggers the daily-goal bonus.
    pub daily_goal_xp: u32,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// One quiz submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizAttempt {
    /// Lesson the quiz belongs to.
    pub lesson_id: String,
    /// Correct answers.
    pub correct: u32,
    /// Questions in the quiz.
    pub total: u32,
    /// Whether the pass threshold was met.
    pub passed: bool,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// All answers were correct.
    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}

/// Everything the service mutates for one learner.
#[derive(Debug)]
pub struct UserRecord {
    /// Profile data.
    pub profile: Profile,
    /// Append-only XP log.
    pub xp_events: Vec<XpEvent>,
    /// Idempotency key -> index into `xp_events`.
    pub award_keys: HashMap<String, usize>,
    /// Streak state.
    pub streak: Streak,
    /// Earned badges and when. Only ever grows.
    pub badges: BTreeMap<BadgeCode, DateTime<Utc>>,
    /// Completed lessons and first completion time.
    pub completed_lessons: BTreeMap<String, DateTime<Utc>>,
    /// Quiz history.
    pub quiz_attempts: Vec<QuizAttempt>,
    /// Challenges won.
    pub challenges_won: u32,
}

impl UserRecord {
    /// Creates an empty record for `profile`.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            xp_events: Vec::new(),
            award_keys: HashMap::new(),
            streak: Streak::default(),
            badges: BTreeMap::new(),
            completed_lessons: BTreeMap::new(),
            quiz_attempts: Vec::new(),
            challenges_won: 0,
        }
    }

    /// Lifetime XP: the sum over the whole event log.
    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.xp_events.iter().map(|e| u64::from(e.amount)).sum()
    }

    /// XP earned in `[from, to)`, skipping event types rejected by `include`.
    #[must_use]
    pub fn xp_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        include: impl Fn(XpEventType) -> bool,
    ) -> u64 {
        self.xp_events
            .iter()
            .filter(|e| e.created_at >= from && e.created_at < to && include(e.event_type))
            .map(|e| u64::from(e.amount))
            .sum()
    }

    /// The event recorded under `key`, if any.
    #[must_use]
    pub fn award_for_key(&self, key: &str) -> Option<&XpEvent> {
        self.award_keys.get(key).and_then(|&i| self.xp_events.get(i))
    }

    /// Appends an event, indexing its idempotency key.
    pub fn push_event(&mut self, event: XpEvent) {
        if let Some(key) = &event.idempotency_key {
            self.award_keys.insert(key.clone(), self.xp_events.len());
        }
        self.xp_events.push(event);
    }

    /// Distinct lessons with at least one perfect quiz.
    #[must_use]
    pub fn perfect_quizzes(&self) -> u32 {
        let lessons: BTreeSet<&str> = self
            .quiz_attempts
            .iter()
            .filter(|a| a.is_perfect())
            .map(|a| a.lesson_id.as_str())
            .collect();
        u32::try_from(lessons.len()).unwrap_or(u32::MAX)
    }

    /// Counters for badge evaluation.
    #[must_use]
    pub fn badge_stats(&self) -> BadgeStats {
        BadgeStats {
            lessons_completed: u32::try_from(self.completed_lessons.len()).unwrap_or(u32::MAX),
            perfect_quizzes: self.perfect_quizzes(),
            current_streak: self.streak.current_streak,
            total_xp: self.total_xp(),
            challenges_won: self.challenges_won,
        }
    }
}
