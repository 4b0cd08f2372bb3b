//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams [`crate::domain::GamificationEvent`]s for
//! the users a client subscribes to, and answers profile queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
