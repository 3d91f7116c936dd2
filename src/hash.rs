//! Content digests and the pluggable hasher seam.
//!
//! A [`ContentHasher`] plays the role `BuildHasher` plays for hash maps: it
//! is a type parameter of the cache, defaulting to [`StructuralHasher`].
//! The hasher sees a [`HashInput`] rather than the raw value so the absent
//! value has its own representative that no real value can produce.

use crate::canonical::Canonical;
use crate::error::{Error, Result};
use core::fmt;
use core::marker::PhantomData;
use serde::Serialize;

/// Opaque, deterministic, content-derived digest.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Box<str>);

impl Digest {
    pub fn new(s: impl Into<Box<str>>) -> Self {
        Digest(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a hasher is asked to digest.
#[derive(Debug)]
pub enum HashInput<'a, T: ?Sized> {
    /// Placeholder substituted for the absent value.
    Absent,
    Value(&'a T),
}

impl<'a, T: ?Sized> Clone for HashInput<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: ?Sized> Copy for HashInput<'a, T> {}

/// Maps a value to its content digest. Equal content must give equal
/// digests; the cache treats distinct digests as distinct content.
pub trait ContentHasher<T: ?Sized> {
    fn digest(&mut self, input: HashInput<'_, T>) -> Result<Digest>;
}

impl<T: ?Sized, H: ContentHasher<T> + ?Sized> ContentHasher<T> for &mut H {
    fn digest(&mut self, input: HashInput<'_, T>) -> Result<Digest> {
        (**self).digest(input)
    }
}

impl<T: ?Sized, H: ContentHasher<T> + ?Sized> ContentHasher<T> for Box<H> {
    fn digest(&mut self, input: HashInput<'_, T>) -> Result<Digest> {
        (**self).digest(input)
    }
}

/// Default hasher: canonical structural digest of any `Serialize` value.
///
/// The value is serialized through a canonical encoder straight into
/// blake3: map and struct entries are ordered by key, numbers are hashed by
/// their normalized `f64` bits (non-finite values included), and `None`
/// (the absent value at any depth) is tagged apart from unit/null.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralHasher;

impl<T: Serialize + ?Sized> ContentHasher<T> for StructuralHasher {
    fn digest(&mut self, input: HashInput<'_, T>) -> Result<Digest> {
        let mut canonical = Canonical::new();
        match input {
            HashInput::Absent => canonical.tag(b'A'),
            HashInput::Value(v) => {
                canonical.tag(b'V');
                v.serialize(&mut canonical)
                    .map_err(|e| Error::Hash(e.to_string()))?;
            }
        }
        Ok(Digest::new(canonical.finish().to_hex().as_str()))
    }
}

/// Compute the default structural digest of a single value.
pub fn structural_digest<T: Serialize + ?Sized>(value: &T) -> Result<Digest> {
    StructuralHasher.digest(HashInput::Value(value))
}

/// Closure-backed hasher; see [`from_fn`].
pub struct FnHasher<F, T: ?Sized> {
    f: F,
    _input: PhantomData<fn(&T)>,
}

/// Adapt a closure into a [`ContentHasher`].
pub fn from_fn<T, F>(f: F) -> FnHasher<F, T>
where
    T: ?Sized,
    F: FnMut(HashInput<'_, T>) -> Result<Digest>,
{
    FnHasher {
        f,
        _input: PhantomData,
    }
}

impl<T, F> ContentHasher<T> for FnHasher<F, T>
where
    T: ?Sized,
    F: FnMut(HashInput<'_, T>) -> Result<Digest>,
{
    fn digest(&mut self, input: HashInput<'_, T>) -> Result<Digest> {
        (self.f)(input)
    }
}

impl<F, T: ?Sized> fmt::Debug for FnHasher<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = Value::object([("a", Value::from(1i64)), ("b", Value::from("x"))]);
        let b = Value::object([("b", Value::from("x")), ("a", Value::from(1i64))]);
        assert_eq!(structural_digest(&a).unwrap(), structural_digest(&b).unwrap());
    }

    #[test]
    fn different_content_different_digest() {
        let a = structural_digest(&json!({"foo": "test"})).unwrap();
        let b = structural_digest(&json!({"foo": "actual change"})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn absent_placeholder_is_distinct() {
        let absent = StructuralHasher
            .digest(HashInput::<Value>::Absent)
            .unwrap();
        let null = structural_digest(&Value::Null).unwrap();
        let look_alike = structural_digest("__undefined__").unwrap();
        assert_ne!(absent, null);
        assert_ne!(absent, look_alike);
    }

    #[test]
    fn non_finite_numbers_and_null_are_distinct() {
        let digests = [
            structural_digest(&Value::Null).unwrap(),
            structural_digest(&Value::Number(f64::NAN)).unwrap(),
            structural_digest(&Value::Number(f64::INFINITY)).unwrap(),
            structural_digest(&Value::Number(f64::NEG_INFINITY)).unwrap(),
        ];
        for (i, a) in digests.iter().enumerate() {
            for b in &digests[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn nested_absent_differs_from_null() {
        let with_null = Value::object([("a", Value::Null)]);
        let with_absent = Value::object([("a", Value::Absent)]);
        assert_ne!(
            structural_digest(&with_null).unwrap(),
            structural_digest(&with_absent).unwrap()
        );
        assert_ne!(
            structural_digest(&Value::array([Value::Null])).unwrap(),
            structural_digest(&Value::array([Value::Absent])).unwrap()
        );
    }

    #[test]
    fn value_numbers_match_typed_integers() {
        assert_eq!(
            structural_digest(&Value::from(json!({"n": 3}))).unwrap(),
            structural_digest(&json!({"n": 3})).unwrap()
        );
    }

    #[test]
    fn strings_do_not_run_together() {
        let a = structural_digest(&["ab", "c"]).unwrap();
        let b = structural_digest(&["a", "bc"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn functions_fail_to_hash() {
        let f = Value::function(|_| Value::Null);
        assert!(matches!(structural_digest(&f), Err(Error::Hash(_))));
    }

    #[test]
    fn from_fn_delegates() {
        let mut calls = 0;
        let mut h = from_fn(|input: HashInput<'_, Value>| {
            calls += 1;
            Ok(Digest::new(match input {
                HashInput::Absent => "absent",
                HashInput::Value(_) => "value",
            }))
        });
        assert_eq!(h.digest(HashInput::Absent).unwrap().as_str(), "absent");
        assert_eq!(h.digest(HashInput::Value(&Value::Null)).unwrap().as_str(), "value");
        drop(h);
        assert_eq!(calls, 2);
    }
}
