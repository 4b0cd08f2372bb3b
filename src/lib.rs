//! # progressia
//!
//! Gamification service for the Progressia financial-education platform:
//! XP awards, daily streaks, weekly leagues, badges, lesson and quiz
//! rewards, and friend challenges, exposed over REST and WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── GamificationService / LearningService / SocialService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Store: per-user records, league board, friends, challenges (domain/)
//!     │
//!     └── PostgreSQL event journal (persistence/, optional)
//! ```
//!
//! Lifetime XP is always the sum of a user's XP events; weekly league
//! entries are a projection updated on every award.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
