//! Debug-only reentrancy check.
//!
//! `HashTable` calls into user code (`K: Hash`, `K: Eq`) while probing a
//! bucket, and relinks nodes while rehashing or erasing. A `Section` marks
//! such a stretch; opening a second one on the same table before the first
//! closes panics in debug builds and names both operations. Release builds
//! keep only a zero-sized marker.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Open a section at the top of a guarded operation with
/// `let _s = self.reentrancy.enter("op");`.
#[derive(Debug)]
pub struct ReentrancyCheck {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // !Sync in every profile, not only when `active` is compiled in.
    _not_sync: PhantomData<Cell<()>>,
}

impl ReentrancyCheck {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _not_sync: PhantomData,
        }
    }

    /// Open a section for `op`. In debug builds, panics if another section
    /// of the same tracker is still open.
    #[inline]
    pub fn enter(&self, op: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to `{op}` while `{outer}` is in progress");
            }
            self.active.set(Some(op));
            Section { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            Section { _owner: PhantomData }
        }
    }

    /// Name of the operation currently holding a section, if any.
    #[cfg(debug_assertions)]
    pub fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for ReentrancyCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Open section; closes on drop.
#[must_use = "the section closes as soon as it is dropped"]
pub struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ReentrancyCheck>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.active.take();
            debug_assert!(prev.is_some());
        }
    }
}
