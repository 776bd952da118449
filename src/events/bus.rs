//! # Event bus for broadcasting scheduler events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from the scheduler state and job drivers.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Subscriber (one):
//!   reconciliation ──┐
//!   job driver 1  ───┼──────► Bus ───────► listener ────► mailboxes
//!   job driver N  ───┘  (broadcast chan)  (spawned by builder)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; safe to call under the scheduler lock.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for scheduler events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(ev);
        }
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::IdleReached).with_waiting(2));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::IdleReached);
        assert_eq!(ev.waiting, Some(2));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::SlotReleased));
    }
}
