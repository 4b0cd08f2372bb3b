//! PostgreSQL implementation of the event journal.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::NewEvent;
use crate::config::AppConfig;
use crate::error::ProgressiaError;

/// PostgreSQL-backed journal using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from the configuration and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`ProgressiaError::PersistenceError`] when the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, ProgressiaError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "event journal connected"
        );
        Ok(Self::new(pool))
    }

    /// Appends an event to the journal.
    ///
    /// # Errors
    ///
    /// Returns a [`ProgressiaError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &NewEvent) -> Result<i64, ProgressiaError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (subject_id, event_type, payload, occurred_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event.subject_id)
        .bind(event.event_type)
        .bind(&event.payload)
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
