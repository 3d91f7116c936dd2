//! ReferenceCache: digest-keyed single-slot cache of the value handed out.

use crate::hash::Digest;
use crate::slot::Slot;

#[derive(Debug, Clone)]
pub struct ReferenceCache<T> {
    slot: Slot<Digest, T>,
}

impl<T: Clone> ReferenceCache<T> {
    pub const fn new() -> Self {
        Self { slot: Slot::new() }
    }

    /// If `digest` matches the stored one, return the stored value and drop
    /// `new_value`; otherwise store and return `new_value`. The first call
    /// always stores.
    pub fn resolve(&mut self, new_value: T, digest: Digest) -> T {
        if let Some(prev) = self.slot.lookup(|k| *k == digest) {
            tracing::trace!(%digest, "reference cache hit");
            return prev.clone();
        }
        tracing::trace!(%digest, "reference cache miss");
        self.slot.store(digest, new_value).clone()
    }

    /// Value returned by the most recent `resolve`.
    pub fn current(&self) -> Option<&T> {
        self.slot.value()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.slot.key()
    }

    pub fn is_seeded(&self) -> bool {
        !self.slot.is_empty()
    }
}

impl<T: Clone> Default for ReferenceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
