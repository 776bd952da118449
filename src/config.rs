//! # Scheduler configuration.
//!
//! [`Config`] defines the scheduler's behavior: pool size, how idle waits
//! registered on an already idle pool are treated, and event bus capacity.
//!
//! ## Sentinel values
//! - `workers = 0` → rejected by [`Config::validate`] (a pool needs at least one slot)
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]
//!
//! # Example
//! ```
//! use workslots::{Config, IdleMode};
//!
//! let mut cfg = Config::default();
//! cfg.workers = 4;
//! cfg.idle = IdleMode::NextRelease;
//!
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.workers, 4);
//! ```

use std::num::NonZeroUsize;

use crate::error::SchedulerError;

/// How [`Scheduler::await_idle`](crate::Scheduler::await_idle) treats a pool
/// that is already idle when the wait is registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdleMode {
    /// Resolve immediately if no slot is occupied and no waiter is queued.
    #[default]
    Immediate,

    /// Never inspect current state at registration; resolve only at the next
    /// release that leaves the pool idle.
    ///
    /// If the pool is already idle and nothing else is ever submitted, the
    /// wait never resolves.
    NextRelease,
}

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// ## Field semantics
/// - `workers`: number of slots, fixed for the scheduler's lifetime (must be `> 0`)
/// - `idle`: registration-time behavior of idle waits
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of execution slots.
    ///
    /// At most `workers` units of work run at the same time.
    pub workers: usize,

    /// Behavior of idle waits registered while the pool is already idle.
    pub idle: IdleMode,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// skip the older ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a configuration with `workers` slots and defaults elsewhere.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Checks the configuration for misuse.
    ///
    /// Returns [`SchedulerError::InvalidWorkerCount`] when `workers == 0`.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.workers == 0 {
            return Err(SchedulerError::InvalidWorkerCount {
                workers: self.workers,
            });
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers` = available parallelism (or 1 if unknown)
    /// - `idle = IdleMode::Immediate`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            idle: IdleMode::default(),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        let cfg = Config::with_workers(0);
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.as_label(), "scheduler_invalid_worker_count");
    }

    #[test]
    fn test_default_is_valid() {
        let cfg = Config::default();
        assert!(cfg.workers >= 1);
        assert_eq!(cfg.idle, IdleMode::Immediate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let mut cfg = Config::with_workers(2);
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
