//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. WebSocket
//! connections and the persistence journal each subscribe once.

use tokio::sync::broadcast;

use super::GamificationEvent;

/// Broadcast bus for [`GamificationEvent`]s.
///
/// When the ring buffer is full the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GamificationEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. With no
    /// active receivers the event is silently dropped.
    pub fn publish(&self, event: GamificationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Publishes events in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = GamificationEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GamificationEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
