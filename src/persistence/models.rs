//! Database models for the event journal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::GamificationEvent;

/// A row of the `events` table, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// User or challenge the event is about.
    pub subject_id: Uuid,
    /// Event type discriminator (e.g. `"xp_awarded"`).
    pub event_type: &'static str,
    /// JSONB payload with the full event.
    pub payload: serde_json::Value,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
}

impl NewEvent {
    /// Builds the journal row for `event`.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the event cannot be encoded.
    pub fn from_event(event: &GamificationEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            subject_id: event.subject_id(),
            event_type: event.event_type_str(),
            payload: serde_json::to_value(event)?,
            occurred_at: event.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChallengeId, UserId};

    #[test]
    fn challenge_events_are_filed_under_the_challenge() {
        let challenge_id = ChallengeId::new();
        let event = GamificationEvent::ChallengeCompleted {
            challenge_id,
            participants: vec![UserId::new(), UserId::new()],
            winners: Vec::new(),
            timestamp: Utc::now(),
        };
        let row = NewEvent::from_event(&event);
        assert!(row.as_ref().is_ok_and(|r| r.subject_id == *challenge_id.as_uuid()));
        assert!(row.is_ok_and(|r| r.payload["event_type"] == "challenge_completed"));
    }
}
