//! In-memory state with per-user fine-grained locking.
//!
//! Each learner's [`UserRecord`] sits behind its own
//! [`tokio::sync::RwLock`], so mutations for one user are serialized while
//! different users proceed concurrently. League, friendship and challenge
//! state each have their own lock.
//!
//! # Lock order
//!
//! challenges, then a user record, then the league board. The friend
//! graph is never held together with another lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::challenge::Challenge;
use super::league::LeagueBoard;
use super::social::FriendGraph;
use super::user::UserRecord;
use super::{ChallengeId, UserId};
use crate::error::ProgressiaError;

/// Central store for all gamification state.
#[derive(Debug, Default)]
pub struct Store {
    users: RwLock<HashMap<UserId, Arc<RwLock<UserRecord>>>>,
    leagues: RwLock<LeagueBoard>,
    friends: RwLock<FriendGraph>,
    challenges: RwLock<HashMap<ChallengeId, Challenge>>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new user record.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressiaError::Conflict`] if the id is already taken
    /// (should never happen with UUID v4).
    pub async fn insert_user(&self, record: UserRecord) -> Result<UserId, ProgressiaError> {
        let user_id = record.profile.id;
        let mut map = self.users.write().await;
        if map.contains_key(&user_id) {
            return Err(ProgressiaError::Conflict(format!(
                "el usuario {user_id} ya existe"
            )));
        }
        map.insert(user_id, Arc::new(RwLock::new(record)));
        Ok(user_id)
    }

    /// Returns the lock around one user's record.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressiaError::UserNotFound`] if the user is unknown.
    pub async fn user(&self, user_id: UserId) -> Result<Arc<RwLock<UserRecord>>, ProgressiaError> {
        let map = self.users.read().await;
        map.get(&user_id)
            .cloned()
            .ok_or(ProgressiaError::UserNotFound(*user_id.as_uuid()))
    }

    /// Fails on the first id in `user_ids` that is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressiaError::UserNotFound`].
    pub async fn ensure_users(&self, user_ids: &[UserId]) -> Result<(), ProgressiaError> {
        let map = self.users.read().await;
        match user_ids.iter().find(|id| !map.contains_key(id)) {
            Some(missing) => Err(ProgressiaError::UserNotFound(*missing.as_uuid())),
            None => Ok(()),
        }
    }

    /// Display names for the known users among `user_ids`.
    pub async fn display_names(&self, user_ids: &[UserId]) -> HashMap<UserId, String> {
        let locks: Vec<(UserId, Arc<RwLock<UserRecord>>)> = {
            let map = self.users.read().await;
            user_ids
                .iter()
                .filter_map(|id| map.get(id).map(|lock| (*id, Arc::clone(lock))))
                .collect()
        };
        let mut names = HashMap::with_capacity(locks.len());
        for (id, lock) in locks {
            names.insert(id, lock.read().await.profile.display_name.clone());
        }
        names
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Weekly league board.
    #[must_use]
    pub fn leagues(&self) -> &RwLock<LeagueBoard> {
        &self.leagues
    }

    /// Friendship graph.
    #[must_use]
    pub fn friends(&self) -> &RwLock<FriendGraph> {
        &self.friends
    }

    /// Challenges by id.
    #[must_use]
    pub fn challenges(&self) -> &RwLock<HashMap<ChallengeId, Challenge>> {
        &self.challenges
    }
}
