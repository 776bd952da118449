//! # Slot permits: scoped acquisition and release.
//!
//! [`Acquire`] registers with the scheduler **when it is created**, not when it
//! is first polled, so FIFO position follows call order. It resolves to a
//! [`SlotPermit`], the capability handle for one claimed slot.
//!
//! ```text
//! Scheduler::acquire()
//!     ├─ slot free    ─► Reservation::Ready(slot)
//!     └─ pool full    ─► Reservation::Queued(rx) ── reconciliation ──► rx gets slot
//!                                   │
//!                                   ▼
//!                              SlotPermit ── drop ──► release(slot) ──► reconcile
//! ```
//!
//! ## Rules
//! - A permit releases its slot exactly once, on drop, on every exit path (including unwinding).
//! - Dropping an [`Acquire`] that was already handed a slot returns the slot to the pool.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::job::JobId;
use super::slot::SlotId;
use super::state::{Reservation, Shared};

/// Exclusive claim on one slot. Releases the slot when dropped.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct SlotPermit {
    shared: Arc<Shared>,
    slot: SlotId,
}

impl SlotPermit {
    pub(crate) fn new(shared: Arc<Shared>, slot: SlotId) -> Self {
        Self { shared, slot }
    }

    /// Returns the claimed slot.
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.shared.release(self.slot);
    }
}

impl fmt::Debug for SlotPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPermit").field("slot", &self.slot).finish()
    }
}

/// Future returned by [`Scheduler::acquire`](crate::Scheduler::acquire).
#[must_use = "futures do nothing unless awaited; dropping an Acquire gives up its queue position"]
pub struct Acquire {
    shared: Arc<Shared>,
    job: Option<JobId>,
    reservation: Option<Reservation>,
}

impl Acquire {
    pub(crate) fn new(shared: Arc<Shared>, job: Option<JobId>) -> Self {
        let reservation = shared.reserve(job);
        Self {
            shared,
            job,
            reservation: Some(reservation),
        }
    }
}

impl Future for Acquire {
    type Output = SlotPermit;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.reservation.take() {
            Some(Reservation::Ready(slot)) => {
                Poll::Ready(SlotPermit::new(Arc::clone(&this.shared), slot))
            }
            Some(Reservation::Queued(mut rx)) => match Pin::new(&mut rx).poll(cx) {
                Poll::Ready(Ok(slot)) => {
                    Poll::Ready(SlotPermit::new(Arc::clone(&this.shared), slot))
                }
                Poll::Ready(Err(_)) => {
                    // Waiter was dropped from the queue without a slot; queue again.
                    this.reservation = Some(this.shared.reserve(this.job));
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
                Poll::Pending => {
                    this.reservation = Some(Reservation::Queued(rx));
                    Poll::Pending
                }
            },
            None => panic!("`Acquire` polled after completion"),
        }
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        match self.reservation.take() {
            Some(Reservation::Ready(slot)) => self.shared.release(slot),
            Some(Reservation::Queued(mut rx)) => {
                rx.close();
                if let Ok(slot) = rx.try_recv() {
                    self.shared.release(slot);
                }
            }
            None => {}
        }
    }
}

impl fmt::Debug for Acquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.reservation {
            Some(Reservation::Ready(_)) => "ready",
            Some(Reservation::Queued(_)) => "queued",
            None => "done",
        };
        f.debug_struct("Acquire")
            .field("job", &self.job)
            .field("state", &state)
            .finish()
    }
}
