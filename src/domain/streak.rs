//! Consecutive-day activity counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::LocalCalendar;

/// Streak milestones and the bonus XP awarded on reaching them.
pub const STREAK_BONUSES: [(u32, u32); 2] = [(7, 50), (30, 150)];

/// Per-user streak state.
///
/// Invariant: `longest_streak >= current_streak`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Streak {
    /// Consecutive active days ending at `last_active_at`.
    pub current_streak: u32,
    /// Best streak ever reached.
    pub longest_streak: u32,
    /// Instant of the last qualifying activity.
    pub last_active_at: Option<DateTime<Utc>>,
}

/// What a qualifying activity did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// First activity ever.
    Started,
    /// Activity on the day after the last one.
    Continued,
    /// Activity after one or more missed days.
    Reset,
    /// Activity on a day that was already counted.
    Unchanged,
}

impl Streak {
    /// Applies one qualifying activity at `now`.
    pub fn record_activity(&mut self, now: DateTime<Utc>, calendar: &LocalCalendar) -> StreakTransition {
        let today = calendar.local_date(now);
        let transition = match self.last_active_at.map(|at| calendar.local_date(at)) {
            None => StreakTransition::Started,
            Some(last) if last >= today => StreakTransition::Unchanged,
            Some(last) if last == LocalCalendar::yesterday(today) => StreakTransition::Continued,
            Some(_) => StreakTransition::Reset,
        };

        match transition {
            StreakTransition::Unchanged => return transition,
            StreakTransition::Started | StreakTransition::Reset => self.current_streak = 1,
            StreakTransition::Continued => {
                self.current_streak = self.current_streak.saturating_add(1);
            }
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_active_at = Some(now);
        transition
    }

    /// Streak as it should be displayed at `now`: zero once a day was missed.
    #[must_use]
    pub fn effective_current(&self, now: DateTime<Utc>, calendar: &LocalCalendar) -> u32 {
        let today = calendar.local_date(now);
        match self.last_active_at.map(|at| calendar.local_date(at)) {
            Some(last) if last >= LocalCalendar::yesterday(today) => self.current_streak,
            _ => 0,
        }
    }
}

/// Bonus XP for reaching `current_streak` through a continuation, if any.
#[must_use]
pub fn streak_bonus(current_streak: u32) -> Option<u32> {
    STREAK_BONUSES
        .iter()
        .find(|(days, _)| *days == current_streak)
        .map(|(_, xp)| *xp)
}
