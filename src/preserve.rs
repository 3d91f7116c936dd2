//! PreserveReference: the entry point wiring guard, hash memo and
//! reference cache together.

use crate::cache::ReferenceCache;
use crate::config::Config;
use crate::error::Result;
use crate::guard::InputGuard;
use crate::hash::{ContentHasher, Digest, HashInput, StructuralHasher};
use crate::memo::HashMemoizer;
use crate::reference::Reference;
use serde::Serialize;

/// Returns a stable reference for successive content-equal values.
///
/// Drive it once per tick with the latest value. While the value's content
/// digest stays the same, `apply` keeps returning the reference it returned
/// first; when the digest changes, the new value is returned and retained.
///
/// ```
/// use preserve_ref::{Config, PreserveReference, Reference, Value};
///
/// let mut preserve = PreserveReference::new(Config::production());
/// let first = preserve.apply(Value::object([("foo", Value::from("test"))])).unwrap();
/// let again = preserve.apply(Value::object([("foo", Value::from("test"))])).unwrap();
/// assert!(first.same_ref(&again));
/// ```
#[derive(Debug)]
pub struct PreserveReference<T, H = StructuralHasher> {
    config: Config,
    guard: InputGuard,
    memo: HashMemoizer<T, H>,
    cache: ReferenceCache<T>,
}

impl<T> PreserveReference<T>
where
    T: Reference + Serialize,
{
    pub fn new(config: Config) -> Self {
        Self::with_hasher(config, StructuralHasher)
    }
}

impl<T, H> PreserveReference<T, H>
where
    T: Reference,
    H: ContentHasher<T>,
{
    pub fn with_hasher(config: Config, hasher: H) -> Self {
        Self {
            guard: InputGuard::new(&config),
            config,
            memo: HashMemoizer::new(hasher),
            cache: ReferenceCache::new(),
        }
    }

    /// Feed the latest value and get back the reference to hand downstream.
    ///
    /// Fails with [`Error::UnsupportedType`](crate::Error::UnsupportedType)
    /// for callables and with [`Error::Hash`](crate::Error::Hash) when the
    /// hasher fails; in both cases no state changes.
    pub fn apply(&mut self, value: T) -> Result<T> {
        self.guard.check(&value)?;
        let input = if value.is_absent() {
            HashInput::Absent
        } else {
            HashInput::Value(&value)
        };
        let digest = self.memo.hash_of(input)?;
        Ok(self.cache.resolve(value, digest))
    }

    /// The reference returned by the last successful `apply`.
    pub fn current(&self) -> Option<&T> {
        self.cache.current()
    }

    pub fn current_digest(&self) -> Option<&Digest> {
        self.cache.digest()
    }

    pub fn is_seeded(&self) -> bool {
        self.cache.is_seeded()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hasher(&self) -> &H {
        self.memo.hasher()
    }
}

impl<T> Default for PreserveReference<T>
where
    T: Reference + Serialize,
{
    fn default() -> Self {
        Self::new(Config::default())
    }
}
