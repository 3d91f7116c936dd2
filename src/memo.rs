//! HashMemoizer: identity-keyed memoization of a content hasher.
//!
//! Hashing may walk the whole value. When the producer hands over the very
//! same reference again (nothing changed upstream), the previous digest is
//! returned and the hasher is not invoked.

use crate::error::Result;
use crate::hash::{ContentHasher, Digest, HashInput};
use crate::reference::Reference;
use crate::slot::Slot;

// Holding a clone of the last input keeps its allocation alive, so a later
// value can never reuse the address and pass the identity check.
#[derive(Debug, Clone)]
enum HashKey<T> {
    Absent,
    Value(T),
}

impl<T: Reference> HashKey<T> {
    fn matches(&self, input: HashInput<'_, T>) -> bool {
        match (self, input) {
            (HashKey::Absent, HashInput::Absent) => true,
            (HashKey::Value(prev), HashInput::Value(v)) => prev.same_ref(v),
            _ => false,
        }
    }

    fn from_input(input: HashInput<'_, T>) -> Self {
        match input {
            HashInput::Absent => HashKey::Absent,
            HashInput::Value(v) => HashKey::Value(v.clone()),
        }
    }
}

#[derive(Debug)]
pub struct HashMemoizer<T, H> {
    hasher: H,
    slot: Slot<HashKey<T>, Digest>,
}

impl<T, H> HashMemoizer<T, H>
where
    T: Reference,
    H: ContentHasher<T>,
{
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            slot: Slot::new(),
        }
    }

    /// Digest of `input`, reusing the stored digest when `input` is the
    /// same reference as the previous call. A hasher error leaves the slot
    /// untouched.
    pub fn hash_of(&mut self, input: HashInput<'_, T>) -> Result<Digest> {
        if let Some(digest) = self.slot.lookup(|key| key.matches(input)) {
            tracing::trace!(%digest, "hash memo hit");
            return Ok(digest.clone());
        }
        let digest = self.hasher.digest(input)?;
        tracing::trace!(%digest, "hash memo miss");
        Ok(self.slot.store(HashKey::from_input(input), digest).clone())
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn last_digest(&self) -> Option<&Digest> {
        self.slot.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hash::{from_fn, structural_digest};
    use crate::value::Value;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(calls: Rc<Cell<usize>>) -> impl ContentHasher<Value> {
        from_fn(move |input: HashInput<'_, Value>| {
            calls.set(calls.get() + 1);
            match input {
                HashInput::Absent => Ok(Digest::new("absent")),
                HashInput::Value(v) => structural_digest(v),
            }
        })
    }

    #[test]
    fn same_reference_hashes_once() {
        let calls = Rc::new(Cell::new(0));
        let mut m = HashMemoizer::new(counting(calls.clone()));
        let v = Value::object([("foo", Value::from("test"))]);
        let a = m.hash_of(HashInput::Value(&v)).unwrap();
        let b = m.hash_of(HashInput::Value(&v.clone())).unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn equal_content_new_reference_rehashes() {
        let calls = Rc::new(Cell::new(0));
        let mut m = HashMemoizer::new(counting(calls.clone()));
        let a = m
            .hash_of(HashInput::Value(&Value::object([("foo", Value::from("test"))])))
            .unwrap();
        let b = m
            .hash_of(HashInput::Value(&Value::object([("foo", Value::from("test"))])))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn capacity_is_one() {
        let calls = Rc::new(Cell::new(0));
        let mut m = HashMemoizer::new(counting(calls.clone()));
        let x = Value::array([Value::from(1i64)]);
        let y = Value::array([Value::from(2i64)]);
        m.hash_of(HashInput::Value(&x)).unwrap();
        m.hash_of(HashInput::Value(&y)).unwrap();
        m.hash_of(HashInput::Value(&x)).unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn absent_placeholder_is_memoized() {
        let calls = Rc::new(Cell::new(0));
        let mut m = HashMemoizer::new(counting(calls.clone()));
        assert!(m.last_digest().is_none());
        let a = m.hash_of(HashInput::Absent).unwrap();
        let b = m.hash_of(HashInput::Absent).unwrap();
        assert_eq!(a, b);
        assert_eq!(m.last_digest(), Some(&a));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn hasher_error_keeps_previous_entry() {
        let mut m = HashMemoizer::new(from_fn(|input: HashInput<'_, Value>| match input {
            HashInput::Value(Value::Null) => Err(Error::Hash("boom".into())),
            _ => Ok(Digest::new("ok")),
        }));
        let v = Value::array([]);
        m.hash_of(HashInput::Value(&v)).unwrap();
        assert!(m.hash_of(HashInput::Value(&Value::Null)).is_err());
        assert_eq!(m.last_digest().map(Digest::as_str), Some("ok"));
    }
}
