//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, GameRules};
use crate::domain::course::Catalog;
use crate::domain::{EventBus, RateLimiter, Store};
use crate::service::{GamificationService, LearningService, SocialService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// XP, streak, badge and league rules.
    pub gamification: Arc<GamificationService>,
    /// Lessons, quizzes and progress.
    pub learning: Arc<LearningService>,
    /// Friendships and challenges.
    pub social: Arc<SocialService>,
    /// Event bus for WebSocket subscriptions and the journal.
    pub event_bus: EventBus,
    /// Per-user limiter for XP-granting endpoints.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires an empty store, the seeded catalog and the services.
    #[must_use]
    pub fn new(rules: GameRules, event_bus: EventBus, rate_limiter: RateLimiter) -> Self {
        let store = Arc::new(Store::new());
        let gamification = Arc::new(GamificationService::new(store, event_bus.clone(), rules));
        let learning = Arc::new(LearningService::new(
            Arc::clone(&gamification),
            Arc::new(Catalog::seed()),
        ));
        let social = Arc::new(SocialService::new(Arc::clone(&gamification)));
        Self {
            gamification,
            learning,
            social,
            event_bus,
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    /// Builds the state described by `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rules,
            EventBus::new(config.event_bus_capacity),
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window_secs),
        )
    }

    /// Spawns the periodic sweep that resolves due challenges and prunes
    /// expired rate-limit windows.
    #[must_use]
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let social = Arc::clone(&self.social);
        let rate_limiter = Arc::clone(&self.rate_limiter);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let now = Utc::now();
                let resolved = social.resolve_due_challenges(now).await;
                let pruned = rate_limiter.prune(now).await;
                if !resolved.is_empty() || pruned > 0 {
                    tracing::info!(resolved = resolved.len(), pruned, "sweep finished");
                }
            }
        })
    }
}
