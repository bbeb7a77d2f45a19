use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// The handle a display layer fills with the sentinel it renders after the list (`loadMoreRef`).
///
/// Clones share the same slot. `S` is whatever identifies the sentinel to the visibility
/// capability: a widget id, a row index, a DOM node handle.
pub struct SentinelRef<S> {
    slot: Arc<Mutex<Option<S>>>,
}

impl<S> Clone for SentinelRef<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S> Default for SentinelRef<S> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<S: Clone> SentinelRef<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<S> {
        self.slot.lock().clone()
    }

    /// Stores a new sentinel, returning the previous one.
    pub fn set(&self, target: Option<S>) -> Option<S> {
        core::mem::replace(&mut *self.slot.lock(), target)
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<S: fmt::Debug> fmt::Debug for SentinelRef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SentinelRef").field(&*self.slot.lock()).finish()
    }
}
