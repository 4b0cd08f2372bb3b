//! Weekly leagues: tier classification and the per-week standings board.
//!
//! Weekly XP is a projection of the XP event log, maintained
//! incrementally: every award bumps exactly one [`LeagueEntry`] and
//! re-derives its tier, instead of re-aggregating the log on read.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Weekly cohort tier, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum League {
    /// 0+ weekly XP.
    Bronze,
    /// 200+ weekly XP.
    Silver,
    /// 500+ weekly XP.
    Gold,
    /// 1000+ weekly XP.
    Diamond,
}

impl League {
    /// Every tier, highest first.
    pub const DESCENDING: [Self; 4] = [Self::Diamond, Self::Gold, Self::Silver, Self::Bronze];

    /// Inclusive lower bound of weekly XP for this tier.
    #[must_use]
    pub const fn min_xp(self) -> u64 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 200,
            Self::Gold => 500,
            Self::Diamond => 1000,
        }
    }
}

/// Classifies weekly XP into a league, testing the highest threshold first.
#[must_use]
pub fn calculate_league(weekly_xp: u64) -> League {
    League::DESCENDING
        .into_iter()
        .find(|league| weekly_xp >= league.min_xp())
        .unwrap_or(League::Bronze)
}

/// One Monday-start calendar week.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeagueWeek {
    /// Week identifier.
    pub id: uuid::Uuid,
    /// Local Monday.
    pub week_start: NaiveDate,
    /// Local Sunday.
    pub week_end: NaiveDate,
    /// When the first award of the week created this row.
    pub created_at: DateTime<Utc>,
}

/// A user's standing in one league week.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeagueEntry {
    /// Week this entry belongs to.
    pub week_id: uuid::Uuid,
    /// Participant.
    pub user_id: UserId,
    /// XP earned this week.
    pub weekly_xp: u64,
    /// Tier derived from `weekly_xp`.
    pub league: League,
    /// Last time `weekly_xp` changed.
    pub updated_at: DateTime<Utc>,
}

/// Result of bumping an entry.
#[derive(Debug, Clone)]
pub struct LeagueUpdate {
    /// Entry after the increment.
    pub entry: LeagueEntry,
    /// Tier before the increment; a fresh entry starts in Bronze.
    pub previous: League,
}

impl LeagueUpdate {
    /// Whether the tier changed with this increment.
    #[must_use]
    pub fn league_changed(&self) -> bool {
        self.previous != self.entry.league
    }
}

/// All league weeks and their entries.
#[derive(Debug, Default)]
pub struct LeagueBoard {
    weeks: HashMap<NaiveDate, LeagueWeek>,
    entries: HashMap<(uuid::Uuid, UserId), LeagueEntry>,
}

impl LeagueBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the week starting at `week_start`, creating it if absent.
    pub fn ensure_week(
        &mut self,
        week_start: NaiveDate,
        week_end: NaiveDate,
        now: DateTime<Utc>,
    ) -> LeagueWeek {
        self.weeks
            .entry(week_start)
            .or_insert_with(|| {
                tracing::info!(%week_start, "league week opened");
                LeagueWeek {
                    id: uuid::Uuid::new_v4(),
                    week_start,
                    week_end,
                    created_at: now,
                }
            })
            .clone()
    }

    /// Returns the week starting at `week_start` without creating it.
    #[must_use]
    pub fn week(&self, week_start: NaiveDate) -> Option<&LeagueWeek> {
        self.weeks.get(&week_start)
    }

    /// Upserts a user's entry for `week_id`, adding `amount` and recomputing
    /// the tier.
    pub fn record_xp(
        &mut self,
        week_id: uuid::Uuid,
        user_id: UserId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> LeagueUpdate {
        let entry = self
            .entries
            .entry((week_id, user_id))
            .or_insert_with(|| LeagueEntry {
                week_id,
                user_id,
                weekly_xp: 0,
                league: League::Bronze,
                updated_at: now,
            });
        let previous = entry.league;
        entry.weekly_xp = entry.weekly_xp.saturating_add(amount);
        entry.league = calculate_league(entry.weekly_xp);
        entry.updated_at = now;
        LeagueUpdate {
            entry: entry.clone(),
            previous,
        }
    }

    /// Returns a user's entry for `week_id`.
    #[must_use]
    pub fn entry(&self, week_id: uuid::Uuid, user_id: UserId) -> Option<&LeagueEntry> {
        self.entries.get(&(week_id, user_id))
    }

    /// All entries of a week, highest weekly XP first; earlier movers win
    /// ties.
    #[must_use]
    pub fn standings(&self, week_id: uuid::Uuid) -> Vec<LeagueEntry> {
        let mut rows: Vec<LeagueEntry> = self
            .entries
            .values()
            .filter(|e| e.week_id == week_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.weekly_xp
                .cmp(&a.weekly_xp)
                .then(a.updated_at.cmp(&b.updated_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        rows
    }
}
