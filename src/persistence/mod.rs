//! Persistence layer: optional PostgreSQL event journal.
//!
//! Gameplay state lives in memory. When persistence is enabled every
//! [`crate::domain::GamificationEvent`] is appended to the `events` table
//! by a [`recorder`] task subscribed to the event bus. Queries go through
//! `sqlx::PgPool`.

pub mod models;
pub mod postgres;
pub mod recorder;
