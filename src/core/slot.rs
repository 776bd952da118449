//! # Slots: units of concurrency capacity.
//!
//! A [`Slot`] is created once per worker when the scheduler is built and is
//! reused for the scheduler's whole lifetime.
//!
//! ```text
//!   Free ──claim──► Occupied ──release──► Free   (release triggers reconciliation)
//! ```

use std::fmt;

/// Stable identifier of a slot (its index in the pool).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Creates a slot id from a pool index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the pool index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// One execution slot. Owned exclusively by the scheduler state.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    occupied: bool,
}

impl Slot {
    pub(crate) fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// `Free → Occupied`.
    pub(crate) fn claim(&mut self) {
        debug_assert!(!self.occupied, "slot claimed twice");
        self.occupied = true;
    }

    /// `Occupied → Free`.
    pub(crate) fn release(&mut self) {
        debug_assert!(self.occupied, "released a free slot");
        self.occupied = false;
    }
}
