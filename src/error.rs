//! Error types used by the scheduler and by submitted work.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`]: misuse of the scheduler itself (bad configuration, missing runtime).
//! - [`WorkError`]: failures of individual units of work, reported through a
//!   [`JobHandle`](crate::JobHandle).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by the scheduler.
///
/// These are raised at construction time; a running scheduler never fails
/// because of the work it executes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The pool must contain at least one slot.
    #[error("invalid worker count {workers}: a scheduler needs at least one worker")]
    InvalidWorkerCount {
        /// The rejected worker count.
        workers: usize,
    },

    /// The scheduler was built outside a tokio runtime; it needs one to run jobs.
    #[error("a scheduler must be built inside a running tokio runtime")]
    NoRuntime,
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workslots::SchedulerError;
    ///
    /// let err = SchedulerError::InvalidWorkerCount { workers: 0 };
    /// assert_eq!(err.as_label(), "scheduler_invalid_worker_count");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidWorkerCount { .. } => "scheduler_invalid_worker_count",
            SchedulerError::NoRuntime => "scheduler_no_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::InvalidWorkerCount { workers } => {
                format!("invalid worker count: {workers}")
            }
            SchedulerError::NoRuntime => "no tokio runtime".to_string(),
        }
    }
}

/// # Errors produced by submitted work.
///
/// A failure is always contained: the slot is released, queued work proceeds,
/// and the error is delivered only to the job's handle (or discarded if the
/// handle was dropped).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// Asynchronous work settled with an error.
    #[error("work failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Work panicked while running.
    #[error("work panicked: {reason}")]
    Panicked {
        /// Panic payload, if it was a string.
        reason: String,
    },

    /// The task driving the job was dropped before the work finished
    /// (typically because the runtime shut down).
    #[error("work aborted before completion")]
    Aborted,
}

impl WorkError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workslots::WorkError;
    ///
    /// let err = WorkError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "work_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Failed { .. } => "work_failed",
            WorkError::Panicked { .. } => "work_panicked",
            WorkError::Aborted => "work_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Failed { error } => format!("error: {error}"),
            WorkError::Panicked { reason } => format!("panic: {reason}"),
            WorkError::Aborted => "aborted".to_string(),
        }
    }

    /// Builds a [`WorkError::Panicked`] from a panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        WorkError::Panicked { reason }
    }

    /// Maps a tokio join failure: panics keep their payload, cancellation becomes `Aborted`.
    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        match err.try_into_panic() {
            Ok(payload) => WorkError::from_panic(payload),
            Err(_) => WorkError::Aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_str() {
        let err = WorkError::from_panic(Box::new("boom"));
        assert_eq!(
            err,
            WorkError::Panicked {
                reason: "boom".into()
            }
        );
    }

    #[test]
    fn test_panic_payload_string() {
        let err = WorkError::from_panic(Box::new(String::from("kaput")));
        assert_eq!(err.as_message(), "panic: kaput");
    }

    #[test]
    fn test_panic_payload_other() {
        let err = WorkError::from_panic(Box::new(42u8));
        assert_eq!(err.as_label(), "work_panicked");
        assert_eq!(err.as_message(), "panic: non-string panic payload");
    }
}
