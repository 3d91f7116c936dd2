//! Identity and classification of cached values.

use std::rc::Rc;

/// Coarse runtime type of a value, used by the input guard and to pick the
/// absent placeholder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Absent,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Function,
}

impl Kind {
    /// Name used in diagnostics ("string", "number", ...).
    pub fn name(self) -> &'static str {
        match self {
            Kind::Absent => "undefined",
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Function => "function",
        }
    }
}

/// A value that can be handed out by the cache.
///
/// `same_ref` is the identity the hash memoizer keys on: two handles to the
/// same allocation are the same reference; two equal-content allocations
/// are not. Cloning must be cheap and must preserve identity.
pub trait Reference: Clone {
    fn same_ref(&self, other: &Self) -> bool;

    fn kind(&self) -> Kind;

    fn is_absent(&self) -> bool {
        self.kind() == Kind::Absent
    }
}

/// Shared allocations compare by pointer and always classify as
/// [`Kind::Object`], whatever the payload. `Rc<str>` or `Rc<String>` is
/// therefore never rejected or warned about by the input guard; use
/// [`Value`](crate::Value) when string and number inputs should be
/// classified as such.
impl<T: ?Sized> Reference for Rc<T> {
    #[inline]
    fn same_ref(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }

    fn kind(&self) -> Kind {
        Kind::Object
    }
}

/// `None` is the absent value.
impl<R: Reference> Reference for Option<R> {
    fn same_ref(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_ref(b),
            _ => false,
        }
    }

    fn kind(&self) -> Kind {
        match self {
            None => Kind::Absent,
            Some(r) => r.kind(),
        }
    }
}
