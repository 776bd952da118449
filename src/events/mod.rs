//! Scheduler events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the scheduler.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::state` (claims, queueing, hand-offs, idle), job
//!   drivers in `core::scheduler` (work start/finish/failure).
//! - **Consumers**: the listener spawned by `SchedulerBuilder::build`, which
//!   copies events into per-subscriber mailboxes.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
