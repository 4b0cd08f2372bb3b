//! Per-connection subscription manager.
//!
//! Tracks which users a WebSocket client follows and filters events
//! server-side.

use std::collections::HashSet;

use crate::domain::UserId;

/// Manages the set of user subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed users. Ignored while `subscribe_all` is set.
    user_ids: HashSet<UserId>,
    /// Whether the client follows everyone (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds users to the subscription set. `wildcard` follows everyone.
    pub fn subscribe(&mut self, ids: &[UserId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.user_ids.extend(ids.iter().copied());
    }

    /// Removes users from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[UserId]) {
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Returns `true` if any of `users` passes the filter.
    #[must_use]
    pub fn matches_any(&self, users: &[UserId]) -> bool {
        self.subscribe_all || users.iter().any(|u| self.user_ids.contains(u))
    }

    /// Returns the number of explicitly followed users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
