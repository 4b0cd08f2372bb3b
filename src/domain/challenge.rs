//! Time-boxed XP competitions between friends.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ChallengeId, UserId};
use crate::error::ProgressiaError;

/// Longest allowed challenge window.
pub const MAX_DURATION_DAYS: u32 = 30;
/// Largest group size, creator included.
pub const MAX_GROUP_SIZE: usize = 10;

/// Challenge format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeKind {
    /// One-on-one.
    Duel,
    /// Three to ten participants.
    Group,
}

/// Challenge lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    /// Within its window and unresolved.
    Active,
    /// Resolved; rewards were handed out.
    Completed,
}

/// A challenge.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Challenge {
    /// Identifier.
    pub id: ChallengeId,
    /// Format.
    pub kind: ChallengeKind,
    /// Title shown to participants.
    pub title: String,
    /// Who created it.
    pub creator: UserId,
    /// Everyone competing, creator first.
    pub participants: Vec<UserId>,
    /// Optional XP target that ends the challenge early.
    pub goal_xp: Option<u64>,
    /// Window start (inclusive).
    pub starts_at: DateTime<Utc>,
    /// Window end (exclusive).
    pub ends_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: ChallengeStatus,
    /// Set on completion.
    pub winners: Vec<UserId>,
    /// Set on completion.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validated creation parameters.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    /// Format.
    pub kind: ChallengeKind,
    /// Title.
    pub title: String,
    /// Creator.
    pub creator: UserId,
    /// Invited friends, creator excluded.
    pub invitees: Vec<UserId>,
    /// Optional XP target.
    pub goal_xp: Option<u64>,
    /// Window length in days.
    pub duration_days: u32,
}

impl NewChallenge {
    /// Checks shape rules that do not need the friend graph.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::InvalidRequest`] describing the first violation.
    pub fn validate(&self) -> Result<(), ProgressiaError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > 100 {
            return Err(invalid("el título debe tener entre 1 y 100 caracteres"));
        }
        if !(1..=MAX_DURATION_DAYS).contains(&self.duration_days) {
            return Err(invalid("la duración debe ser de 1 a 30 días"));
        }
        if self.goal_xp == Some(0) {
            return Err(invalid("la meta de XP debe ser positiva"));
        }
        if self.invitees.contains(&self.creator) {
            return Err(invalid("no puedes invitarte a tu propio reto"));
        }
        let mut unique = self.invitees.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != self.invitees.len() {
            return Err(invalid("hay participantes repetidos"));
        }
        match self.kind {
            ChallengeKind::Duel if self.invitees.len() != 1 => {
                Err(invalid("un duelo necesita exactamente un rival"))
            }
            ChallengeKind::Group
                if self.invitees.len() < 2 || self.invitees.len() >= MAX_GROUP_SIZE =>
            {
                Err(invalid("un reto grupal necesita de 2 a 9 invitados"))
            }
            _ => Ok(()),
        }
    }

    /// Builds the active challenge starting at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Challenge {
        let mut participants = Vec::with_capacity(self.invitees.len().saturating_add(1));
        participants.push(self.creator);
        participants.extend(self.invitees);
        Challenge {
            id: ChallengeId::new(),
            kind: self.kind,
            title: self.title.trim().to_string(),
            creator: self.creator,
            participants,
            goal_xp: self.goal_xp,
            starts_at: now,
            ends_at: now + Duration::days(i64::from(self.duration_days)),
            status: ChallengeStatus::Active,
            winners: Vec::new(),
            completed_at: None,
        }
    }
}

fn invalid(message: &str) -> ProgressiaError {
    ProgressiaError::InvalidRequest(message.to_string())
}

impl Challenge {
    /// Whether the challenge should be resolved at `now` given participant
    /// progress.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>, progress: &BTreeMap<UserId, u64>) -> bool {
        if self.status != ChallengeStatus::Active {
            return false;
        }
        now >= self.ends_at
            || self
                .goal_xp
                .is_some_and(|goal| progress.values().any(|&xp| xp >= goal))
    }
}

/// Participants with the highest progress. Empty when nobody scored.
#[must_use]
pub fn winners(progress: &BTreeMap<UserId, u64>) -> Vec<UserId> {
    let best = progress.values().copied().max().unwrap_or(0);
    if best == 0 {
        return Vec::new();
    }
    progress
        .iter()
        .filter(|&(_, &xp)| xp == best)
        .map(|(&user, _)| user)
        .collect()
}
