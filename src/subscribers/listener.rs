//! # Bus listener and per-subscriber mailboxes.
//!
//! One listener task reads the scheduler's bus and copies every event into each
//! subscriber's own bounded mailbox. Each mailbox is drained by one worker task,
//! so a slow or panicking subscriber never holds up the scheduler or its peers.
//!
//! ```text
//! Bus ──► listener ──┬─► [mailbox] ─► worker ─► LogWriter::on_event
//!                    └─► [mailbox] ─► worker ─► Custom::on_event
//! ```
//!
//! An event that does not fit in a mailbox is dropped for that subscriber only.
//! Drops are counted: one warning per overflow run when the mailbox accepts
//! events again, and a total when the listener stops.
//!
//! The listener stops when the last scheduler clone is dropped (the bus
//! closes). It then closes every mailbox and waits for the workers to drain.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::WorkError;
use crate::events::Event;

use super::Subscribe;

/// Listener-side end of one subscriber's queue.
struct Mailbox {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    /// Drops since the mailbox last accepted an event.
    overflow_run: u64,
    /// Drops over the listener's lifetime.
    dropped: u64,
}

impl Mailbox {
    /// Opens a mailbox and spawns the worker that drains it.
    fn open(runtime: &Handle, sub: Arc<dyn Subscribe>) -> (Self, JoinHandle<()>) {
        let name = sub.name();
        let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
        let worker = runtime.spawn(drain(sub, rx));
        let mailbox = Self {
            name,
            tx,
            overflow_run: 0,
            dropped: 0,
        };
        (mailbox, worker)
    }

    /// Offers one event. Returns `false` once the worker is gone for good.
    fn deliver(&mut self, ev: &Arc<Event>) -> bool {
        match self.tx.try_send(Arc::clone(ev)) {
            Ok(()) => {
                if self.overflow_run > 0 {
                    tracing::warn!(
                        subscriber = self.name,
                        dropped = self.overflow_run,
                        "subscriber mailbox overflowed; events dropped"
                    );
                    self.overflow_run = 0;
                }
                true
            }
            Err(TrySendError::Full(_)) => {
                self.overflow_run += 1;
                self.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(subscriber = self.name, "subscriber worker stopped; detaching");
                false
            }
        }
    }
}

/// Worker loop: feeds one subscriber, isolating its panics.
async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = rx.recv().await {
        if let Err(payload) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await {
            let reason = WorkError::from_panic(payload).as_message();
            tracing::warn!(subscriber = sub.name(), seq = ev.seq, %reason, "subscriber panicked");
        }
    }
}

/// Spawns the listener and one worker per subscriber on `runtime`.
///
/// The returned handle completes after the bus has closed and every worker
/// has finished its backlog.
pub(crate) fn spawn_listener(
    runtime: &Handle,
    mut rx: broadcast::Receiver<Event>,
    subs: Vec<Arc<dyn Subscribe>>,
) -> JoinHandle<()> {
    let (mut mailboxes, workers): (Vec<Mailbox>, Vec<JoinHandle<()>>) =
        subs.into_iter().map(|sub| Mailbox::open(runtime, sub)).unzip();

    runtime.spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let ev = Arc::new(ev);
                    mailboxes.retain_mut(|m| m.deliver(&ev));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }

        for m in mailboxes.iter().filter(|m| m.dropped > 0) {
            tracing::warn!(subscriber = m.name, dropped = m.dropped, "subscriber missed events");
        }
        drop(mailboxes);
        for worker in workers {
            let _ = worker.await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Bus, EventKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Collect {
        seen: Arc<Mutex<Vec<u64>>>,
        capacity: usize,
    }

    impl Collect {
        fn new(capacity: usize) -> (Arc<Self>, Arc<Mutex<Vec<u64>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sub = Arc::new(Self {
                seen: Arc::clone(&seen),
                capacity,
            });
            (sub, seen)
        }
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.seq);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
        fn queue_capacity(&self) -> usize {
            self.capacity
        }
    }

    struct Boom;

    #[async_trait]
    impl Subscribe for Boom {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "boom"
        }
    }

    #[tokio::test]
    async fn test_delivers_in_order_and_stops_when_bus_closes() {
        let bus = Bus::new(64);
        let (sub, seen) = Collect::new(64);
        let listener = spawn_listener(&Handle::current(), bus.subscribe(), vec![sub]);

        let events: Vec<Event> = (0..5).map(|_| Event::new(EventKind::SlotReleased)).collect();
        for ev in &events {
            bus.publish(ev.clone());
        }
        drop(bus);
        listener.await.unwrap();

        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_is_isolated() {
        let bus = Bus::new(64);
        let (sub, seen) = Collect::new(64);
        let listener = spawn_listener(&Handle::current(), bus.subscribe(), vec![Arc::new(Boom), sub]);

        bus.publish(Event::new(EventKind::IdleReached));
        bus.publish(Event::new(EventKind::IdleReached));
        drop(bus);
        listener.await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_full_mailbox_drops_for_that_subscriber_only() {
        let bus = Bus::new(64);
        let (tight, tight_seen) = Collect::new(1);
        let (roomy, roomy_seen) = Collect::new(64);
        let listener = spawn_listener(&Handle::current(), bus.subscribe(), vec![tight, roomy]);

        for _ in 0..10 {
            bus.publish(Event::new(EventKind::WorkStarted));
        }
        drop(bus);
        listener.await.unwrap();

        let tight = tight_seen.lock().unwrap().len();
        assert!((1..10).contains(&tight), "tight mailbox saw {tight} events");
        assert_eq!(roomy_seen.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = Bus::new(8);
        let listener = spawn_listener(&Handle::current(), bus.subscribe(), Vec::new());
        bus.publish(Event::new(EventKind::SlotClaimed));
        drop(bus);
        listener.await.unwrap();
    }
}
