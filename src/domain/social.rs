//! Friendships between learners.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::ProgressiaError;

/// Lifecycle of a friendship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    /// Requested, waiting for the addressee.
    Pending,
    /// Both sides agreed.
    Accepted,
}

/// A friendship edge.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Friendship {
    /// Who sent the request.
    pub requester: UserId,
    /// Who must accept.
    pub addressee: UserId,
    /// Current status.
    pub status: FriendshipStatus,
    /// Request timestamp.
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// The other side of the edge as seen from `user`.
    #[must_use]
    pub fn other(&self, user: UserId) -> UserId {
        if self.requester == user {
            self.addressee
        } else {
            self.requester
        }
    }
}

/// Undirected friendship graph keyed by the ordered user pair.
#[derive(Debug, Default)]
pub struct FriendGraph {
    edges: HashMap<(UserId, UserId), Friendship>,
}

fn pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl FriendGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pending request from `requester` to `addressee`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::InvalidRequest`] for a self request and
    /// [`ProgressiaError::Conflict`] when an edge already exists.
    pub fn request(
        &mut self,
        requester: UserId,
        addressee: UserId,
        now: DateTime<Utc>,
    ) -> Result<Friendship, ProgressiaError> {
        if requester == addressee {
            return Err(ProgressiaError::InvalidRequest(
                "no puedes agregarte como amigo".to_string(),
            ));
        }
        let key = pair(requester, addressee);
        if self.edges.contains_key(&key) {
            return Err(ProgressiaError::Conflict(
                "ya existe una solicitud o amistad entre estos usuarios".to_string(),
            ));
        }
        let edge = Friendship {
            requester,
            addressee,
            status: FriendshipStatus::Pending,
            created_at: now,
        };
        self.edges.insert(key, edge.clone());
        Ok(edge)
    }

    /// Accepts the pending request `requester` sent to `addressee`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::FriendshipNotFound`] when no such pending request
    /// addressed to `addressee` exists, [`ProgressiaError::Conflict`] when it
    /// was already accepted.
    pub fn accept(
        &mut self,
        addressee: UserId,
        requester: UserId,
    ) -> Result<Friendship, ProgressiaError> {
        let edge = self
            .edges
            .get_mut(&pair(requester, addressee))
            .filter(|e| e.addressee == addressee)
            .ok_or(ProgressiaError::FriendshipNotFound)?;
        if edge.status == FriendshipStatus::Accepted {
            return Err(ProgressiaError::Conflict("la amistad ya fue aceptada".to_string()));
        }
        edge.status = FriendshipStatus::Accepted;
        Ok(edge.clone())
    }

    /// Whether `a` and `b` are accepted friends.
    #[must_use]
    pub fn are_friends(&self, a: UserId, b: UserId) -> bool {
        self.edges
            .get(&pair(a, b))
            .is_some_and(|e| e.status == FriendshipStatus::Accepted)
    }

    /// Every edge touching `user`, pending ones included.
    #[must_use]
    pub fn edges_of(&self, user: UserId) -> Vec<Friendship> {
        let mut edges: Vec<Friendship> = self
            .edges
            .values()
            .filter(|e| e.requester == user || e.addressee == user)
            .cloned()
            .collect();
        edges.sort_by_key(|e| e.created_at);
        edges
    }

    /// Accepted friends of `user`.
    #[must_use]
    pub fn friends_of(&self, user: UserId) -> Vec<UserId> {
        self.edges_of(user)
            .into_iter()
            .filter(|e| e.status == FriendshipStatus::Accepted)
            .map(|e| e.other(user))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_then_accept() {
        let mut graph = FriendGraph::new();
        let (a, b) = (UserId::new(), UserId::new());
        assert!(graph.request(a, b, Utc::now()).is_ok());
        assert!(!graph.are_friends(a, b));

        assert!(graph.accept(b, a).is_ok());
        assert!(graph.are_friends(a, b));
        assert!(graph.are_friends(b, a));
        assert_eq!(graph.friends_of(a), vec![b]);
    }

    #[test]
    fn only_addressee_can_accept() {
        let mut graph = FriendGraph::new();
        let (a, b) = (UserId::new(), UserId::new());
        let _ = graph.request(a, b, Utc::now());
        assert!(matches!(graph.accept(a, b), Err(ProgressiaError::FriendshipNotFound)));
    }

    #[test]
    fn rejects_self_and_duplicate_requests() {
        let mut graph = FriendGraph::new();
        let (a, b) = (UserId::new(), UserId::new());
        assert!(matches!(
            graph.request(a, a, Utc::now()),
            Err(ProgressiaError::InvalidRequest(_))
        ));
        let _ = graph.request(a, b, Utc::now());
        assert!(matches!(graph.request(b, a, Utc::now()), Err(ProgressiaError::Conflict(_))));
    }

    #[test]
    fn pending_edges_are_not_friends() {
        let mut graph = FriendGraph::new();
        let (a, b) = (UserId::new(), UserId::new());
        let _ = graph.request(a, b, Utc::now());
        assert!(graph.friends_of(a).is_empty());
        assert_eq!(graph.edges_of(b).len(), 1);
    }
}
