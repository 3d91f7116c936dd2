//! Slot: a fixed-capacity-one key/value cache.
//!
//! Both memoization layers are a `Slot` plus a rule for comparing keys.
//! Key and value live in one `Option`, so "value present iff key present"
//! holds by construction. A slot is never cleared; a write supersedes the
//! previous entry.

#[derive(Debug, Clone)]
pub struct Slot<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> Slot<K, V> {
    pub const fn new() -> Self {
        Self { entry: None }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, v)| v)
    }

    /// Return the stored value if `matches` accepts the stored key.
    #[inline]
    pub fn lookup(&self, matches: impl FnOnce(&K) -> bool) -> Option<&V> {
        match &self.entry {
            Some((k, v)) if matches(k) => Some(v),
            _ => None,
        }
    }

    /// Overwrite the entry, returning a reference to the new value.
    #[inline]
    pub fn store(&mut self, key: K, value: V) -> &V {
        let (_, v) = self.entry.insert((key, value));
        v
    }
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
