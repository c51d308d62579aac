//! Generation numbering.
//!
//! Every installed generation is stamped with a revision from the engine's
//! counter, so callers can tell whether a map they hold predates a reload.

use std::sync::atomic::{AtomicU64, Ordering};

/// A generation number. Higher means more recent.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Revision(u64);

impl Revision {
    /// The empty generation installed before the first reload.
    pub const INITIAL: Self = Self(0);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_newer_than(self, other: Self) -> bool {
        self.0 > other.0
    }
}

/// Atomic revision counter.
#[derive(Debug)]
pub struct RevisionCounter {
    current: AtomicU64,
}

impl RevisionCounter {
    #[inline]
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(Revision::INITIAL.0),
        }
    }

    #[inline]
    pub fn current(&self) -> Revision {
        Revision(self.current.load(Ordering::Acquire))
    }

    /// Increment and return the new revision.
    #[inline]
    pub fn increment(&self) -> Revision {
        let new_value = self.current.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        Revision(new_value)
    }
}

impl Default for RevisionCounter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
