//! Domain layer: gamification rules, state containers and the event system.
//!
//! The pure rules (league tiers, streak transitions, badge thresholds,
//! challenge resolution) live next to the containers that hold their
//! state, so the service layer only orchestrates.

pub mod badge;
pub mod calendar;
pub mod challenge;
pub mod course;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod league;
pub mod rate_limit;
pub mod social;
pub mod store;
pub mod streak;
pub mod user;
pub mod xp;

pub use calendar::LocalCalendar;
pub use event::GamificationEvent;
pub use event_bus::EventBus;
pub use ids::{ChallengeId, UserId};
pub use league::{League, calculate_league};
pub use rate_limit::RateLimiter;
pub use store::Store;
pub use xp::XpEventType;
