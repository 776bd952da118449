//! # Scheduler state and the reconciliation algorithm.
//!
//! [`State`] is the single combined object holding the slot pool and both FIFO
//! queues. It is only ever touched under [`Shared`]'s mutex, so a slot claim
//! and the matching queue pop are never observed as separate steps.
//!
//! ## Reconciliation (once per release)
//! ```text
//! release(slot)
//!   ├─► slot: Occupied → Free
//!   ├─► while waiters non-empty AND a slot is free:
//!   │       pop oldest waiter ─► claim slot ─► send(slot)
//!   │                                 └─ receiver gone ─► free slot again, continue
//!   └─► if waiters empty AND no slot occupied:
//!           drain idle waiters (FIFO), resolve each
//! ```
//!
//! ## Rules
//! - Occupied slots never exceed the pool size.
//! - Waiters are admitted strictly in registration order.
//! - Idle waiters resolve only when zero slots are occupied and zero waiters are queued.
//! - No user code runs while the lock is held; resolving a waiter is a non-blocking `send`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::IdleMode;
use crate::events::{Bus, Event, EventKind};

use super::job::JobId;
use super::slot::{Slot, SlotId};

/// A queued submission waiting for a free slot.
struct Waiter {
    job: Option<JobId>,
    tx: oneshot::Sender<SlotId>,
}

/// Outcome of registering for a slot.
pub(crate) enum Reservation {
    /// A free slot was claimed synchronously.
    Ready(SlotId),
    /// No slot was free; the receiver resolves when reconciliation hands one over.
    Queued(oneshot::Receiver<SlotId>),
}

/// Point-in-time view of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Pool size.
    pub workers: usize,
    /// Slots currently occupied.
    pub occupied: usize,
    /// Submissions queued for a slot.
    pub waiting: usize,
    /// Pending idle waits.
    pub idle_waiters: usize,
}

impl Snapshot {
    /// True if no slot is occupied and no submission is queued.
    pub fn is_idle(&self) -> bool {
        self.occupied == 0 && self.waiting == 0
    }
}

/// Slot pool plus the two FIFO queues.
pub(crate) struct State {
    slots: Vec<Slot>,
    waiters: VecDeque<Waiter>,
    idle_waiters: VecDeque<oneshot::Sender<()>>,
}

impl State {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| Slot::default()).collect(),
            waiters: VecDeque::new(),
            idle_waiters: VecDeque::new(),
        }
    }

    fn free_index(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.is_occupied())
    }

    fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    fn is_idle(&self) -> bool {
        self.waiters.is_empty() && self.occupied() == 0
    }

    /// Drops queued slot waiters whose receiving side is gone.
    fn prune_closed(&mut self) {
        self.waiters.retain(|w| !w.tx.is_closed());
    }

    /// Drops idle waits whose [`Idle`](super::Idle) future was dropped.
    fn prune_idle(&mut self) {
        self.idle_waiters.retain(|tx| !tx.is_closed());
    }

    /// Claims the first free slot, if any.
    fn try_claim(&mut self) -> Option<SlotId> {
        let index = self.free_index()?;
        self.slots[index].claim();
        Some(SlotId::new(index))
    }

    /// Like [`State::try_claim`], but refuses to jump ahead of queued waiters.
    pub(crate) fn try_claim_unqueued(&mut self) -> Option<SlotId> {
        if !self.waiters.is_empty() {
            return None;
        }
        self.try_claim()
    }

    /// Claims a free slot or joins the back of the waiter queue.
    ///
    /// A new submission never claims ahead of queued waiters.
    pub(crate) fn reserve(&mut self, job: Option<JobId>, bus: &Bus) -> Reservation {
        if let Some(slot) = self.try_claim_unqueued() {
            bus.publish(
                Event::new(EventKind::SlotClaimed)
                    .with_slot(slot)
                    .with_job_opt(job),
            );
            return Reservation::Ready(slot);
        }

        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(Waiter { job, tx });
        bus.publish(
            Event::new(EventKind::WaiterQueued)
                .with_job_opt(job)
                .with_waiting(self.waiters.len()),
        );
        Reservation::Queued(rx)
    }

    /// Frees `slot` and runs reconciliation.
    pub(crate) fn release(&mut self, slot: SlotId, bus: &Bus) {
        self.slots[slot.index()].release();
        bus.publish(Event::new(EventKind::SlotReleased).with_slot(slot));
        self.reconcile(bus);
    }

    fn reconcile(&mut self, bus: &Bus) {
        while !self.waiters.is_empty() {
            let Some(index) = self.free_index() else {
                break;
            };
            let Some(waiter) = self.waiters.pop_front() else {
                break;
            };

            let slot = SlotId::new(index);
            self.slots[index].claim();
            if waiter.tx.send(slot).is_err() {
                // Waiter went away before its turn.
                self.slots[index].release();
                continue;
            }
            bus.publish(
                Event::new(EventKind::WaiterAdmitted)
                    .with_slot(slot)
                    .with_job_opt(waiter.job)
                    .with_waiting(self.waiters.len()),
            );
        }

        if self.is_idle() {
            self.resolve_idle(bus);
        }
    }

    fn resolve_idle(&mut self, bus: &Bus) {
        if self.idle_waiters.is_empty() {
            return;
        }
        let mut resolved = 0;
        while let Some(tx) = self.idle_waiters.pop_front() {
            if tx.send(()).is_ok() {
                resolved += 1;
            }
        }
        bus.publish(Event::new(EventKind::IdleReached).with_waiting(resolved));
    }

    /// Registers an idle wait.
    ///
    /// Returns `None` when the wait is already satisfied (only in
    /// [`IdleMode::Immediate`]).
    pub(crate) fn register_idle(
        &mut self,
        mode: IdleMode,
        bus: &Bus,
    ) -> Option<oneshot::Receiver<()>> {
        if mode == IdleMode::Immediate {
            self.prune_closed();
            if self.is_idle() {
                return None;
            }
        }

        self.prune_idle();
        let (tx, rx) = oneshot::channel();
        self.idle_waiters.push_back(tx);
        bus.publish(
            Event::new(EventKind::IdleWaitRegistered).with_waiting(self.idle_waiters.len()),
        );
        Some(rx)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            workers: self.slots.len(),
            occupied: self.occupied(),
            waiting: self.waiters.iter().filter(|w| !w.tx.is_closed()).count(),
            idle_waiters: self.idle_waiters.iter().filter(|tx| !tx.is_closed()).count(),
        }
    }
}

/// State shared between the scheduler handle, permits and job drivers.
pub(crate) struct Shared {
    state: Mutex<State>,
    pub(crate) bus: Bus,
    pub(crate) idle_mode: IdleMode,
    pub(crate) workers: usize,
    pub(crate) runtime: Handle,
    next_job: AtomicU64,
}

impl Shared {
    pub(crate) fn new(workers: usize, idle_mode: IdleMode, bus: Bus, runtime: Handle) -> Self {
        Self {
            state: Mutex::new(State::new(workers)),
            bus,
            idle_mode,
            workers,
            runtime,
            next_job: AtomicU64::new(1),
        }
    }

    /// Locks the state. Every mutation leaves `State` consistent between
    /// statements, so a poisoned lock is safe to recover.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_job(&self) -> JobId {
        JobId::new(self.next_job.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn reserve(&self, job: Option<JobId>) -> Reservation {
        self.lock().reserve(job, &self.bus)
    }

    pub(crate) fn try_claim(&self) -> Option<SlotId> {
        let slot = self.lock().try_claim_unqueued()?;
        self.bus.publish(Event::new(EventKind::SlotClaimed).with_slot(slot));
        Some(slot)
    }

    pub(crate) fn release(&self, slot: SlotId) {
        self.lock().release(slot, &self.bus);
    }

    pub(crate) fn register_idle(&self) -> Option<oneshot::Receiver<()>> {
        self.lock().register_idle(self.idle_mode, &self.bus)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Bus {
        Bus::new(64)
    }

    fn queued(r: Reservation) -> oneshot::Receiver<SlotId> {
        match r {
            Reservation::Queued(rx) => rx,
            Reservation::Ready(slot) => panic!("expected queued, got {slot}"),
        }
    }

    fn ready(r: Reservation) -> SlotId {
        match r {
            Reservation::Ready(slot) => slot,
            Reservation::Queued(_) => panic!("expected ready"),
        }
    }

    #[test]
    fn test_claims_until_pool_exhausted() {
        let bus = bus();
        let mut st = State::new(2);

        let a = ready(st.reserve(None, &bus));
        let b = ready(st.reserve(None, &bus));
        assert_ne!(a, b);

        let _rx = queued(st.reserve(None, &bus));
        let snap = st.snapshot();
        assert_eq!(snap.occupied, 2);
        assert_eq!(snap.waiting, 1);
    }

    #[test]
    fn test_release_admits_waiters_in_fifo_order() {
        let bus = bus();
        let mut st = State::new(1);

        let first = ready(st.reserve(None, &bus));
        let mut w1 = queued(st.reserve(None, &bus));
        let mut w2 = queued(st.reserve(None, &bus));
        let mut w3 = queued(st.reserve(None, &bus));

        st.release(first, &bus);
        let s1 = w1.try_recv().unwrap();
        assert!(w2.try_recv().is_err());
        assert!(w3.try_recv().is_err());

        st.release(s1, &bus);
        let s2 = w2.try_recv().unwrap();
        assert!(w3.try_recv().is_err());

        st.release(s2, &bus);
        let s3 = w3.try_recv().unwrap();
        assert_eq!(st.snapshot().occupied, 1);

        st.release(s3, &bus);
        assert!(st.snapshot().is_idle());
    }

    #[test]
    fn test_idle_waiters_resolve_only_when_fully_idle() {
        let bus = bus();
        let mut st = State::new(2);

        let a = ready(st.reserve(None, &bus));
        let b = ready(st.reserve(None, &bus));
        let mut idle1 = st.register_idle(IdleMode::Immediate, &bus).unwrap();
        let mut idle2 = st.register_idle(IdleMode::Immediate, &bus).unwrap();

        st.release(a, &bus);
        assert!(idle1.try_recv().is_err());

        st.release(b, &bus);
        assert!(idle1.try_recv().is_ok());
        assert!(idle2.try_recv().is_ok());
        assert_eq!(st.snapshot().idle_waiters, 0);
    }

    #[test]
    fn test_idle_not_reached_while_waiters_pending() {
        let bus = bus();
        let mut st = State::new(1);

        let a = ready(st.reserve(None, &bus));
        let mut w = queued(st.reserve(None, &bus));
        let mut idle = st.register_idle(IdleMode::Immediate, &bus).unwrap();

        st.release(a, &bus);
        let b = w.try_recv().unwrap();
        assert!(idle.try_recv().is_err());

        st.release(b, &bus);
        assert!(idle.try_recv().is_ok());
    }

    #[test]
    fn test_immediate_mode_resolves_on_idle_pool() {
        let bus = bus();
        let mut st = State::new(3);
        assert!(st.register_idle(IdleMode::Immediate, &bus).is_none());
    }

    #[test]
    fn test_next_release_mode_waits_on_idle_pool() {
        let bus = bus();
        let mut st = State::new(1);

        let mut idle = st.register_idle(IdleMode::NextRelease, &bus).unwrap();
        assert!(idle.try_recv().is_err());

        let a = ready(st.reserve(None, &bus));
        st.release(a, &bus);
        assert!(idle.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_waiter_is_skipped() {
        let bus = bus();
        let mut st = State::new(1);

        let a = ready(st.reserve(None, &bus));
        let gone = queued(st.reserve(None, &bus));
        let mut next = queued(st.reserve(None, &bus));
        drop(gone);

        st.release(a, &bus);
        let slot = next.try_recv().unwrap();
        assert_eq!(slot, a);
        assert_eq!(st.snapshot().occupied, 1);
        assert_eq!(st.snapshot().waiting, 0);
    }

    #[test]
    fn test_all_waiters_dropped_leaves_pool_idle() {
        let bus = bus();
        let mut st = State::new(1);

        let a = ready(st.reserve(None, &bus));
        drop(queued(st.reserve(None, &bus)));
        let mut idle = st.register_idle(IdleMode::Immediate, &bus).unwrap();

        st.release(a, &bus);
        assert!(idle.try_recv().is_ok());
        assert!(st.snapshot().is_idle());
    }

    #[test]
    fn test_abandoned_idle_waits_are_pruned() {
        let bus = bus();
        let mut st = State::new(1);

        for _ in 0..100 {
            drop(st.register_idle(IdleMode::NextRelease, &bus));
        }
        assert_eq!(st.snapshot().idle_waiters, 0);
        assert!(st.idle_waiters.len() <= 1);

        let a = ready(st.reserve(None, &bus));
        for _ in 0..100 {
            drop(st.register_idle(IdleMode::Immediate, &bus));
        }
        let mut live = st.register_idle(IdleMode::Immediate, &bus).unwrap();
        assert_eq!(st.snapshot().idle_waiters, 1);
        assert_eq!(st.idle_waiters.len(), 1);

        st.release(a, &bus);
        assert!(live.try_recv().is_ok());
    }

    #[test]
    fn test_reconcile_emits_events() {
        let bus = bus();
        let mut rx = bus.subscribe();
        let mut st = State::new(1);

        let a = ready(st.reserve(None, &bus));
        let _w = queued(st.reserve(None, &bus));
        st.release(a, &bus);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SlotClaimed,
                EventKind::WaiterQueued,
                EventKind::SlotReleased,
                EventKind::WaiterAdmitted,
            ]
        );
    }
}
