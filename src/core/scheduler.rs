//! # Scheduler: bounded-concurrency admission with FIFO fairness.
//!
//! The [`Scheduler`] owns a fixed pool of slots. Each submission claims one
//! slot for the duration of its work; excess submissions queue in FIFO order
//! and are admitted as slots are released.
//!
//! ## Submission flow
//! ```text
//! submit_sync(f) / submit_async(f)
//!   ├─► JobId assigned
//!   ├─► Acquire::new()            (claim now, or join the waiter queue now)
//!   └─► runtime.spawn(driver)     (handle captured when the scheduler was built)
//!          ├─► acquire.await      ─► SlotPermit
//!          ├─► dispatched.send(slot), publish WorkStarted
//!          ├─► run work (panics caught)
//!          │     ├─ sync : spawn_blocking(f).await
//!          │     └─ async: f().await
//!          ├─► publish WorkCompleted | WorkFailed | WorkPanicked
//!          └─► drop(permit)       ─► release ─► reconcile (next waiter / idle waiters)
//! ```
//!
//! A job's outcome event is always published before its `SlotReleased`.
//!
//! ## Failure policy
//! Work failures (an `Err` from async work, or a panic in either variant) never
//! escape the job: the slot is released, queued work proceeds, and the error is
//! returned through the job's [`JobHandle`]. Dropping the handle discards it.
//!
//! ## Example
//! ```rust
//! use workslots::Scheduler;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::new(2)?;
//!
//!     let sum = scheduler.submit_sync(|| (1..=10).sum::<u32>());
//!     let fetched = scheduler.submit_async(|| async {
//!         tokio::time::sleep(std::time::Duration::from_millis(5)).await;
//!         Ok::<_, std::io::Error>("payload")
//!     });
//!
//!     scheduler.await_idle().await;
//!     assert_eq!(sum.await?, 55);
//!     assert_eq!(fetched.await?, "payload");
//!     Ok(())
//! }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::error::{SchedulerError, WorkError};
use crate::events::{Bus, Event, EventKind};

use super::builder::SchedulerBuilder;
use super::idle::Idle;
use super::job::{JobHandle, JobId};
use super::permit::{Acquire, SlotPermit};
use super::slot::SlotId;
use super::state::{Shared, Snapshot};

/// Bounded-concurrency work scheduler.
///
/// Cheap to clone; clones share the same slot pool and queues.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Creates a scheduler with `workers` slots and default settings.
    ///
    /// Must be called from within a tokio runtime; the scheduler runs all of its
    /// jobs on that runtime.
    ///
    /// ### Errors
    /// - [`SchedulerError::InvalidWorkerCount`] if `workers == 0`
    /// - [`SchedulerError::NoRuntime`] if no tokio runtime is running
    pub fn new(workers: usize) -> Result<Self, SchedulerError> {
        Self::builder(Config::with_workers(workers)).build()
    }

    /// Returns a builder for a scheduler with the given configuration.
    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn from_config(cfg: &Config, bus: Bus, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared::new(cfg.workers, cfg.idle, bus, runtime)),
        }
    }

    /// Pool size.
    pub fn workers(&self) -> usize {
        self.shared.workers
    }

    /// Point-in-time view of slots and queues.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot()
    }

    /// True if no slot is occupied and no submission is queued.
    pub fn is_idle(&self) -> bool {
        self.snapshot().is_idle()
    }

    /// Claims a slot, queueing in FIFO order if none is free.
    ///
    /// The request is registered immediately; awaiting only waits for the hand-off.
    pub fn acquire(&self) -> Acquire {
        Acquire::new(Arc::clone(&self.shared), None)
    }

    /// Claims a free slot without waiting.
    ///
    /// Returns `None` if every slot is occupied or other submissions are queued.
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        let slot = self.shared.try_claim()?;
        Some(SlotPermit::new(Arc::clone(&self.shared), slot))
    }

    /// Waits until no slot is occupied and no submission is queued.
    ///
    /// Registration happens at call time. Whether an already idle pool
    /// resolves immediately depends on [`Config::idle`].
    pub fn await_idle(&self) -> Idle {
        Idle::new(self.shared.register_idle())
    }

    /// Submits synchronous work.
    ///
    /// The work runs on tokio's blocking pool once a slot is claimed. The slot
    /// is released when `work` returns or panics. May be called from any
    /// thread, inside the runtime or not.
    pub fn submit_sync<F, T>(&self, work: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_job(move || async move {
            tokio::task::spawn_blocking(work)
                .await
                .map_err(WorkError::from_join)
        })
    }

    /// Submits asynchronous work.
    ///
    /// `work` is invoked once a slot is claimed; the slot is held until the
    /// returned future settles, whether with `Ok`, `Err`, or a panic.
    pub fn submit_async<F, Fut, T, E>(&self, work: F) -> JobHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.spawn_job(move || async move {
            work().await.map_err(|e| WorkError::Failed {
                error: e.to_string(),
            })
        })
    }

    /// Registers a job and spawns its driver on the scheduler's runtime.
    fn spawn_job<R, Fut, T>(&self, run: R) -> JobHandle<T>
    where
        R: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, WorkError>> + Send + 'static,
        T: Send + 'static,
    {
        let job = self.shared.next_job();
        let acquire = Acquire::new(Arc::clone(&self.shared), Some(job));
        let bus = self.shared.bus.clone();
        let (dispatched_tx, dispatched_rx) = oneshot::channel();

        let join = self.shared.runtime.spawn(async move {
            let permit = acquire.await;
            let slot = permit.slot();
            let _ = dispatched_tx.send(slot);
            bus.publish(Event::new(EventKind::WorkStarted).with_slot(slot).with_job(job));

            let res = match AssertUnwindSafe(run()).catch_unwind().await {
                Ok(res) => res,
                Err(payload) => Err(WorkError::from_panic(payload)),
            };
            publish_outcome(&bus, slot, job, &res);
            drop(permit);
            res
        });

        JobHandle::new(job, dispatched_rx, join)
    }
}

fn publish_outcome<T>(bus: &Bus, slot: SlotId, job: JobId, res: &Result<T, WorkError>) {
    let ev = match res {
        Ok(_) => Event::new(EventKind::WorkCompleted),
        Err(WorkError::Panicked { reason }) => {
            Event::new(EventKind::WorkPanicked).with_reason(reason.as_str())
        }
        Err(e) => Event::new(EventKind::WorkFailed).with_reason(e.as_message()),
    };
    bus.publish(ev.with_slot(slot).with_job(job));
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
