//! Background task that appends bus events to the journal.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::models::NewEvent;
use super::postgres::PostgresPersistence;
use crate::domain::EventBus;

/// Subscribes to `event_bus` and writes every event to `journal` until the
/// bus closes.
///
/// Write failures are logged and skipped; gameplay never waits on the
/// database.
#[must_use]
pub fn spawn(event_bus: &EventBus, journal: PostgresPersistence) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let row = match NewEvent::from_event(&event) {
                        Ok(row) => row,
                        Err(err) => {
                            tracing::warn!(error = %err, "event could not be encoded");
                            continue;
                        }
                    };
                    if let Err(err) = journal.save_event(&row).await {
                        tracing::warn!(
                            error = %err,
                            event_type = row.event_type,
                            "journal write failed"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "journal recorder lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::info!("journal recorder stopped");
    })
}
