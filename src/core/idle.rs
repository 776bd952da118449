//! # Idle notification.
//!
//! [`Idle`] is returned by [`Scheduler::await_idle`](crate::Scheduler::await_idle).
//! It is registered eagerly; all idle waits pending at the same reconciliation
//! event resolve together, in registration order.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Future that resolves when the scheduler becomes idle.
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct Idle {
    rx: Option<oneshot::Receiver<()>>,
}

impl Idle {
    /// `None` means the wait was already satisfied at registration.
    pub(crate) fn new(rx: Option<oneshot::Receiver<()>>) -> Self {
        Self { rx }
    }
}

impl Future for Idle {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let Some(rx) = this.rx.as_mut() else {
            return Poll::Ready(());
        };
        // A closed channel means the scheduler itself is gone, with nothing left running.
        match Pin::new(rx).poll(cx) {
            Poll::Ready(_) => {
                this.rx = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
