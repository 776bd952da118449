//! # Scheduler events.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Admission events**: slot claims, queued waiters, FIFO hand-offs, releases
//! - **Work events**: start, completion, failure, panic of submitted work
//! - **Idle events**: idle-wait registration and resolution
//!
//! The [`Event`] struct carries additional metadata such as timestamps, slot,
//! job id, waiter queue depth and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use workslots::{Event, EventKind, JobId, SlotId};
//!
//! let ev = Event::new(EventKind::WorkFailed)
//!     .with_slot(SlotId::new(2))
//!     .with_job(JobId::new(7))
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::WorkFailed);
//! assert_eq!(ev.slot, Some(SlotId::new(2)));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::{JobId, SlotId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// A free slot was claimed synchronously at submission time.
    ///
    /// Sets:
    /// - `slot`: claimed slot
    /// - `job`: job id (absent for bare `acquire`)
    SlotClaimed,

    /// No slot was free; the submission joined the FIFO waiter queue.
    ///
    /// Sets:
    /// - `job`: job id (absent for bare `acquire`)
    /// - `waiting`: queue depth including this waiter
    WaiterQueued,

    /// Reconciliation handed a released slot to the oldest waiter.
    ///
    /// Sets:
    /// - `slot`: handed-over slot
    /// - `job`: job id of the admitted waiter (absent for bare `acquire`)
    /// - `waiting`: queue depth after the hand-off
    WaiterAdmitted,

    /// A slot was released back to the pool.
    ///
    /// For a submitted job this follows its outcome event
    /// (`WorkCompleted`, `WorkFailed` or `WorkPanicked`).
    ///
    /// Sets:
    /// - `slot`: released slot
    SlotReleased,

    // === Work events ===
    /// Submitted work started running on its slot.
    ///
    /// Sets:
    /// - `slot`, `job`
    WorkStarted,

    /// Submitted work finished successfully.
    ///
    /// Sets:
    /// - `slot`, `job`
    WorkCompleted,

    /// Submitted asynchronous work settled with an error.
    ///
    /// Sets:
    /// - `slot`, `job`
    /// - `reason`: error message
    WorkFailed,

    /// Submitted work panicked.
    ///
    /// Sets:
    /// - `slot`, `job`
    /// - `reason`: panic message
    WorkPanicked,

    // === Idle events ===
    /// An idle wait was registered and is pending.
    ///
    /// Sets:
    /// - `waiting`: number of pending idle waits including this one
    IdleWaitRegistered,

    /// The pool became idle; pending idle waits were resolved.
    ///
    /// Sets:
    /// - `waiting`: number of idle waits resolved
    IdleReached,
}

/// Scheduler event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Slot the event refers to, if any.
    pub slot: Option<SlotId>,
    /// Job the event refers to, if any.
    pub job: Option<JobId>,
    /// Queue depth (slot waiters or idle waiters, depending on the kind).
    pub waiting: Option<usize>,
    /// Human-readable reason (error or panic message).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            job: None,
            waiting: None,
            reason: None,
        }
    }

    /// Attaches a slot id.
    #[inline]
    pub fn with_slot(mut self, slot: SlotId) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a job id.
    #[inline]
    pub fn with_job(mut self, job: JobId) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches an optional job id.
    #[inline]
    pub(crate) fn with_job_opt(mut self, job: Option<JobId>) -> Self {
        self.job = job;
        self
    }

    /// Attaches a queue depth.
    #[inline]
    pub fn with_waiting(mut self, n: usize) -> Self {
        self.waiting = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::SlotClaimed);
        let b = Event::new(EventKind::SlotReleased);
        assert!(b.seq > a.seq);
    }
}
