//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] forwards events to `tracing` in a compact, human-readable form.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Output format
//! ```text
//! [claimed] slot=slot-0 job=job-1
//! [queued] job=job-3 waiting=1
//! [admitted] slot=slot-0 job=job-3 waiting=0
//! [failed] slot=slot-1 job=job-2 reason="connection refused"
//! [idle] resolved=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Logging subscriber that writes every event through `tracing`.
///
/// Enabled via the `logging` feature. Work failures and panics are logged at
/// `warn`, everything else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn field<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let slot = field(e.slot);
        let job = field(e.job);
        match e.kind {
            EventKind::SlotClaimed => {
                tracing::debug!("[claimed] slot={slot} job={job}");
            }
            EventKind::WaiterQueued => {
                tracing::debug!("[queued] job={job} waiting={}", field(e.waiting));
            }
            EventKind::WaiterAdmitted => {
                tracing::debug!(
                    "[admitted] slot={slot} job={job} waiting={}",
                    field(e.waiting)
                );
            }
            EventKind::SlotReleased => {
                tracing::debug!("[released] slot={slot}");
            }
            EventKind::WorkStarted => {
                tracing::debug!("[started] slot={slot} job={job}");
            }
            EventKind::WorkCompleted => {
                tracing::debug!("[completed] slot={slot} job={job}");
            }
            EventKind::WorkFailed => {
                tracing::warn!(
                    "[failed] slot={slot} job={job} reason={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::WorkPanicked => {
                tracing::warn!(
                    "[panicked] slot={slot} job={job} reason={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::IdleWaitRegistered => {
                tracing::debug!("[idle-wait] pending={}", field(e.waiting));
            }
            EventKind::IdleReached => {
                tracing::debug!("[idle] resolved={}", field(e.waiting));
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
