//! Scheduler core: slots, queues, admission and release.
//!
//! The public API from this module is [`Scheduler`] and the handle types it
//! returns. Everything that touches slot occupancy or the waiter queues lives
//! in [`state`], behind one mutex.
//!
//! Internal modules:
//! - [`slot`]: slot identity and `Free ⇄ Occupied` state;
//! - [`state`]: slot pool, FIFO waiter queue, idle queue, reconciliation;
//! - [`permit`]: eager registration (`Acquire`) and RAII release (`SlotPermit`);
//! - [`idle`]: the `Idle` future;
//! - [`job`]: job ids and handles;
//! - [`scheduler`]: submission wrappers (sync / async);
//! - [`builder`]: configuration and subscriber wiring.

mod builder;
mod idle;
mod job;
mod permit;
mod scheduler;
mod slot;
mod state;

pub use builder::SchedulerBuilder;
pub use idle::Idle;
pub use job::{JobHandle, JobId};
pub use permit::{Acquire, SlotPermit};
pub use scheduler::Scheduler;
pub use slot::SlotId;
pub use state::Snapshot;
