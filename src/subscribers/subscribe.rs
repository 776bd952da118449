//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing the scheduler. Each
//! subscriber is driven by a dedicated worker loop fed by a bounded mailbox
//! that the scheduler's bus listener fills.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   scheduler nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** and a `tracing` warning is emitted.
//!
//! ## Example
//! ```rust
//! use workslots::{Event, EventKind, Subscribe};
//!
//! struct Rejections;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Rejections {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::WorkFailed | EventKind::WorkPanicked) {
//!             // export a metric, etc.
//!         }
//!     }
//!     fn name(&self) -> &'static str { "rejections" }
//!     fn queue_capacity(&self) -> usize { 512 }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
