//! Canonical content encoding fed straight into blake3.
//!
//! `Canonical` is a `serde::Serializer` that writes a tagged byte stream
//! instead of a document. Containers are hashed Merkle-style: every element,
//! key and value gets its own digest, and map/struct entries are sorted by
//! key digest so insertion order never matters.
//!
//! Tags: `u` none/absent, `n` unit/null, `t`/`f` bool, `d` float bits,
//! `i` integer not exactly representable as f64, `U` u128 above i128,
//! `s` string, `b` bytes, `[` sequence, `{` map.
//!
//! Numbers: every integer that survives the round trip through `f64` is
//! hashed as that float, so `5u32`, `5i64` and `5.0` agree. `-0.0` folds
//! into `0.0` and every NaN into one canonical NaN.

use core::fmt::Display;
use serde::ser::{self, Serialize};
use thiserror::Error;

pub(crate) type Hash = [u8; 32];

#[derive(Error, Debug)]
#[error("{0}")]
pub(crate) struct CanonicalError(String);

impl ser::Error for CanonicalError {
    fn custom<T: Display>(msg: T) -> Self {
        CanonicalError(msg.to_string())
    }
}

type Res = Result<(), CanonicalError>;

pub(crate) struct Canonical {
    hasher: blake3::Hasher,
}

impl Canonical {
    pub(crate) fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub(crate) fn tag(&mut self, t: u8) {
        self.hasher.update(&[t]);
    }

    pub(crate) fn finish(&self) -> blake3::Hash {
        self.hasher.finalize()
    }

    fn len(&mut self, n: usize) {
        self.hasher.update(&(n as u64).to_le_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.len(b.len());
        self.hasher.update(b);
    }

    fn float(&mut self, v: f64) {
        let v = if v == 0.0 {
            0.0
        } else if v.is_nan() {
            f64::NAN
        } else {
            v
        };
        self.tag(b'd');
        self.hasher.update(&v.to_bits().to_le_bytes());
    }

    fn int(&mut self, v: i128) {
        let f = v as f64;
        if f as i128 == v {
            self.float(f);
        } else {
            self.tag(b'i');
            self.hasher.update(&v.to_le_bytes());
        }
    }

    fn seq(&mut self, items: &[Hash]) {
        self.tag(b'[');
        self.len(items.len());
        for item in items {
            self.hasher.update(item);
        }
    }

    fn map(&mut self, entries: &mut [(Hash, Hash)]) {
        entries.sort_unstable();
        self.tag(b'{');
        self.len(entries.len());
        for (k, v) in entries.iter() {
            self.hasher.update(k);
            self.hasher.update(v);
        }
    }
}

/// Digest of one value in isolation.
pub(crate) fn digest_of<T: Serialize + ?Sized>(value: &T) -> Result<Hash, CanonicalError> {
    let mut c = Canonical::new();
    value.serialize(&mut c)?;
    Ok(*c.finish().as_bytes())
}

enum Shape {
    Seq,
    Map,
}

pub(crate) struct Compound<'a> {
    parent: &'a mut Canonical,
    shape: Shape,
    // Enum variants are encoded as a one-entry map `{variant: body}`.
    variant: Option<&'static str>,
    items: Vec<Hash>,
    entries: Vec<(Hash, Hash)>,
    pending_key: Option<Hash>,
}

impl<'a> Compound<'a> {
    fn new(parent: &'a mut Canonical, shape: Shape, variant: Option<&'static str>) -> Self {
        Self {
            parent,
            shape,
            variant,
            items: Vec::new(),
            entries: Vec::new(),
            pending_key: None,
        }
    }

    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        self.items.push(digest_of(value)?);
        Ok(())
    }

    fn field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Res {
        self.entries.push((digest_of(key)?, digest_of(value)?));
        Ok(())
    }

    fn finish(mut self) -> Res {
        match self.variant {
            None => self.write_body_to_parent(),
            Some(name) => {
                let mut body = Canonical::new();
                match self.shape {
                    Shape::Seq => body.seq(&self.items),
                    Shape::Map => body.map(&mut self.entries),
                }
                let mut wrapped = [(digest_of(name)?, *body.finish().as_bytes())];
                self.parent.map(&mut wrapped);
                Ok(())
            }
        }
    }

    fn write_body_to_parent(mut self) -> Res {
        match self.shape {
            Shape::Seq => self.parent.seq(&self.items),
            Shape::Map => self.parent.map(&mut self.entries),
        }
        Ok(())
    }
}

impl<'a> ser::Serializer for &'a mut Canonical {
    type Ok = ();
    type Error = CanonicalError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn serialize_bool(self, v: bool) -> Res {
        self.tag(if v { b't' } else { b'f' });
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Res {
        self.int(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Res {
        self.int(v.into());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Res {
        match i128::try_from(v) {
            Ok(i) => self.int(i),
            Err(_) => {
                self.tag(b'U');
                self.hasher.update(&v.to_le_bytes());
            }
        }
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Res {
        self.float(v.into());
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Res {
        self.float(v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Res {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Res {
        self.tag(b's');
        self.bytes(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Res {
        self.tag(b'b');
        self.bytes(v);
        Ok(())
    }

    fn serialize_none(self) -> Res {
        self.tag(b'u');
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Res {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Res {
        self.tag(b'n');
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Res {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Res {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Res {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Res {
        let mut entry = [(digest_of(variant)?, digest_of(value)?)];
        self.map(&mut entry);
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Seq, None))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Seq, None))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Seq, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Seq, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Map, None))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Map, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CanonicalError> {
        Ok(Compound::new(self, Shape::Map, Some(variant)))
    }
}

impl<'a> ser::SerializeSeq for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        self.element(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeTuple for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        self.element(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeTupleStruct for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        self.element(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeTupleVariant for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        self.element(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeMap for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Res {
        self.pending_key = Some(digest_of(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Res {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| CanonicalError("map value serialized before its key".into()))?;
        self.entries.push((key, digest_of(value)?));
        Ok(())
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeStruct for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Res {
        self.field(key, value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl<'a> ser::SerializeStructVariant for Compound<'a> {
    type Ok = ();
    type Error = CanonicalError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Res {
        self.field(key, value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::digest_of;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[test]
    fn integers_and_floats_agree() {
        assert_eq!(digest_of(&5u32).unwrap(), digest_of(&5.0f64).unwrap());
        assert_eq!(digest_of(&-7i8).unwrap(), digest_of(&-7.0f32).unwrap());
        assert_eq!(digest_of(&0.0f64).unwrap(), digest_of(&-0.0f64).unwrap());
        assert_ne!(digest_of(&5u32).unwrap(), digest_of(&5.5f64).unwrap());
    }

    #[test]
    fn large_integers_stay_exact() {
        let a = (1i64 << 60) + 1;
        let b = (1i64 << 60) + 2;
        assert_ne!(digest_of(&a).unwrap(), digest_of(&b).unwrap());
        assert_ne!(digest_of(&u128::MAX).unwrap(), digest_of(&(u128::MAX - 1)).unwrap());
    }

    #[test]
    fn non_finite_numbers_are_distinct() {
        let nan = digest_of(&f64::NAN).unwrap();
        let inf = digest_of(&f64::INFINITY).unwrap();
        let neg_inf = digest_of(&f64::NEG_INFINITY).unwrap();
        let unit = digest_of(&()).unwrap();
        assert_ne!(inf, neg_inf);
        assert_ne!(nan, inf);
        assert_ne!(nan, unit);
        assert_ne!(inf, unit);
        assert_eq!(nan, digest_of(&-f64::NAN).unwrap());
    }

    #[test]
    fn none_and_unit_differ() {
        assert_ne!(digest_of(&None::<u8>).unwrap(), digest_of(&()).unwrap());
        assert_eq!(digest_of(&Some(3u8)).unwrap(), digest_of(&3u8).unwrap());
    }

    #[test]
    fn struct_matches_map_with_same_fields() {
        #[derive(Serialize)]
        struct Point {
            y: i32,
            x: i32,
        }
        let mut map = BTreeMap::new();
        map.insert("x", 1);
        map.insert("y", 2);
        assert_eq!(
            digest_of(&Point { y: 2, x: 1 }).unwrap(),
            digest_of(&map).unwrap()
        );
    }

    #[test]
    fn empty_seq_and_empty_map_differ() {
        let seq: Vec<u8> = Vec::new();
        let map: BTreeMap<String, u8> = BTreeMap::new();
        assert_ne!(digest_of(&seq).unwrap(), digest_of(&map).unwrap());
    }

    #[test]
    fn nesting_is_unambiguous() {
        assert_ne!(
            digest_of(&vec![vec![1, 2], vec![3]]).unwrap(),
            digest_of(&vec![vec![1], vec![2, 3]]).unwrap()
        );
    }

    #[test]
    fn enum_variants_are_distinguished() {
        #[derive(Serialize)]
        enum Shape {
            Circle(f64),
            Square(f64),
            Rect { w: f64, h: f64 },
            Pair(u8, u8),
        }
        let circle = digest_of(&Shape::Circle(1.0)).unwrap();
        let square = digest_of(&Shape::Square(1.0)).unwrap();
        assert_ne!(circle, square);
        assert_ne!(
            digest_of(&Shape::Rect { w: 1.0, h: 2.0 }).unwrap(),
            digest_of(&Shape::Rect { w: 2.0, h: 1.0 }).unwrap()
        );
        assert_ne!(
            digest_of(&Shape::Pair(1, 2)).unwrap(),
            digest_of(&Shape::Pair(2, 1)).unwrap()
        );
    }
}
