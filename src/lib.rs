//! # workslots
//!
//! **Workslots** is a small bounded-concurrency work scheduler for tokio.
//!
//! It runs submitted work (blocking closures or futures) on a fixed pool of
//! slots, admits excess work in strict FIFO order as slots free up, and lets
//! callers wait until the whole pool goes idle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit_sync(f)      submit_async(f)       acquire()        await_idle()
//!        │                    │                   │                  │
//!        ▼                    ▼                   ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Scheduler (Arc<Shared>, cheap to clone)                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐  │
//! │  │ Mutex<State>                                                    │  │
//! │  │  - slots:   [Free | Occupied] × workers                         │  │
//! │  │  - waiters: VecDeque<oneshot::Sender<SlotId>>   (FIFO)          │  │
//! │  │  - idle:    VecDeque<oneshot::Sender<()>>       (FIFO)          │  │
//! │  └─────────────────────────────────────────────────────────────────┘  │
//! │  - Bus (broadcast events)                                             │
//! └──────┬───────────────────────────────┬────────────────────────────────┘
//!        │ SlotPermit dropped            │ publish(Event)
//!        ▼                               ▼
//!   release(slot) ──► reconcile    ┌─────────────────────┐
//!     ├─ waiter queued ─► slot to  │ listener (optional) │
//!     │                   oldest   └──────────┬──────────┘
//!     └─ pool idle     ─► resolve             ▼
//!                         idle waits   mailboxes ─► sub.on_event()
//! ```
//!
//! ### Lifecycle of one job
//! ```text
//! submit ──► JobId ──► Acquire (claim or enqueue, synchronously)
//!                        │
//!                        ▼
//!                  driver task: acquire.await ──► WorkStarted
//!                        │
//!                        ├─ Ok        ─► WorkCompleted ─► JobHandle yields Ok(T)
//!                        ├─ Err(e)    ─► WorkFailed    ─► JobHandle yields WorkError::Failed
//!                        └─ panic     ─► WorkPanicked  ─► JobHandle yields WorkError::Panicked
//!                        │
//!                        ▼
//!                  permit dropped ─► slot released ─► reconcile
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Scheduling**    | Fixed slot pool with FIFO admission.                         | [`Scheduler`], [`JobHandle`]               |
//! | **Permits**       | Scoped manual slot acquisition.                              | [`Acquire`], [`SlotPermit`]                |
//! | **Idle waits**    | Wait until no slot is occupied and nothing is queued.        | [`Idle`], [`IdleMode`]                     |
//! | **Subscriber API**| Observe claims, hand-offs and work outcomes.                 | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for the scheduler and for submitted work.       | [`SchedulerError`], [`WorkError`]          |
//! | **Configuration** | Centralize scheduler settings.                               | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] that writes through `tracing` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use workslots::{Config, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn workslots::Subscribe>> = vec![Arc::new(workslots::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn workslots::Subscribe>> = Vec::new();
//!
//!     let scheduler = Scheduler::builder(Config::with_workers(2))
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let jobs: Vec<_> = (0..5u64)
//!         .map(|i| scheduler.submit_async(move || async move { Ok::<_, std::io::Error>(i * i) }))
//!         .collect();
//!
//!     scheduler.await_idle().await;
//!
//!     let mut total = 0;
//!     for job in jobs {
//!         total += job.await?;
//!     }
//!     assert_eq!(total, 30);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, IdleMode};
pub use core::{
    Acquire, Idle, JobHandle, JobId, Scheduler, SchedulerBuilder, SlotId, SlotPermit, Snapshot,
};
pub use error::{SchedulerError, WorkError};
pub use events::{Event, EventKind};
pub use subscribers::Subscribe;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
