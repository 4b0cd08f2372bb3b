//! progressia server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use progressia::api;
use progressia::app_state::AppState;
use progressia::config::AppConfig;
use progressia::persistence::postgres::PostgresPersistence;
use progressia::persistence::recorder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        utc_offset_secs = config.rules.calendar.offset().local_minus_utc(),
        persistence = config.persistence_enabled,
        "starting progressia"
    );

    let app_state = AppState::from_config(&config);

    if config.persistence_enabled {
        let journal = PostgresPersistence::connect(&config)
            .await
            .context("connecting to the event journal")?;
        let _recorder = recorder::spawn(&app_state.event_bus, journal);
    }

    let _sweeper =
        app_state.spawn_sweeper(Duration::from_secs(config.challenge_sweep_interval_secs));

    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
