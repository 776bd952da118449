//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the bus listener that feeds
//! subscribers, and an optional built-in `LogWriter` (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Scheduler ── publish(Event) ──► Bus ──► listener ──► per-subscriber mailboxes
//!                                                          │
//!                                            ┌─────────────┼─────────────┐
//!                                            ▼             ▼             ▼
//!                                        LogWriter      Metrics       Custom
//! ```
//!
//! The listener task is spawned by
//! [`SchedulerBuilder::build`](crate::SchedulerBuilder::build) only when at
//! least one subscriber is registered, and stops once the last scheduler
//! clone is dropped.

#[cfg(feature = "logging")]
mod log;
mod listener;
mod subscribe;

pub(crate) use listener::spawn_listener;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
