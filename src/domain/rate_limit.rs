//! Fixed-window request counter.
//!
//! Each key gets a window that opens on its first request and resets
//! once `window` has elapsed by wall clock. Requests beyond
//! `max_requests` inside a window are rejected with the time left until
//! the reset.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::error::ProgressiaError;

/// Upper bound on a configured window (one year).
const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window limiter keyed by arbitrary strings (`"<user>:<action>"`).
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window_secs`.
    #[must_use]
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(i64::try_from(window_secs.clamp(1, MAX_WINDOW_SECS)).unwrap_or(1)),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request for `key` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressiaError::RateLimited`] when the window for `key`
    /// is exhausted.
    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> Result<(), ProgressiaError> {
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now - window.started_at >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }
        if window.count >= self.max_requests {
            let remaining = window.started_at + self.window - now;
            let retry_after_ms = u64::try_from(remaining.num_milliseconds()).unwrap_or(0);
            tracing::warn!(key, retry_after_ms, "rate limit exceeded");
            return Err(ProgressiaError::RateLimited { retry_after_ms });
        }
        window.count = window.count.saturating_add(1);
        Ok(())
    }

    /// Drops windows that have already expired at `now`.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now - w.started_at < self.window);
        before.saturating_sub(windows.len())
    }
}
