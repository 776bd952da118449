//! # Job handles.
//!
//! Every submission gets a [`JobId`] and returns a [`JobHandle`]. The handle
//! answers two separate questions:
//!
//! ```text
//! submit_*(work) ──► JobHandle
//!                      ├─ dispatched().await ─► Some(SlotId)   slot claimed, work started
//!                      └─ .await             ─► Result<T, WorkError>   work finished, slot released
//! ```
//!
//! Dropping the handle (or calling [`JobHandle::detach`]) does not stop the
//! work; its outcome is simply discarded.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::WorkError;

use super::slot::SlotId;

/// Per-scheduler job identifier, assigned in submission order starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Creates a job id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Handle to a submitted unit of work.
///
/// Awaiting the handle yields the work's result once it has finished and its
/// slot has been released.
#[must_use = "dropping a JobHandle discards the job's outcome; use `detach` to make that explicit"]
pub struct JobHandle<T> {
    id: JobId,
    dispatched: Option<oneshot::Receiver<SlotId>>,
    slot: Option<SlotId>,
    join: JoinHandle<Result<T, WorkError>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(
        id: JobId,
        dispatched: oneshot::Receiver<SlotId>,
        join: JoinHandle<Result<T, WorkError>>,
    ) -> Self {
        Self {
            id,
            dispatched: Some(dispatched),
            slot: None,
            join,
        }
    }

    /// Returns the job id.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Waits until the job has claimed a slot and its work has started.
    ///
    /// Returns the slot the job runs on, or `None` if the job was dropped by
    /// the runtime before it was dispatched.
    pub async fn dispatched(&mut self) -> Option<SlotId> {
        if let Some(slot) = self.slot {
            return Some(slot);
        }
        let rx = self.dispatched.take()?;
        let slot = rx.await.ok()?;
        self.slot = Some(slot);
        Some(slot)
    }

    /// Returns `true` once the work has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Lets the job run to completion without observing its outcome.
    pub fn detach(self) {}
}

impl<T> Future for JobHandle<T> {
    type Output = Result<T, WorkError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.join).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(err)) => Poll::Ready(Err(WorkError::from_join(err))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("finished", &self.join.is_finished())
            .finish()
    }
}
