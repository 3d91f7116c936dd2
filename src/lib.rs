//! preserve-ref: hand back the previous value while its content is
//! unchanged, so consumers that compare by identity stay quiet.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: given a stream of successively produced values, return the
//!   previously returned reference whenever the new value is content-equal
//!   to it, even if the producer allocated a fresh object.
//! - Layers:
//!   - Slot<K, V>: capacity-one key/value cache shared by both layers.
//!   - HashMemoizer<T, H>: caches the digest of the last input, keyed by
//!     reference identity, so an unchanged reference is never re-hashed.
//!   - ReferenceCache<T>: caches the last returned value, keyed by digest.
//!   - InputGuard: rejects callables and warns about primitives before any
//!     slot is touched.
//!   - PreserveReference<T, H>: guard, then memoized hash, then cache.
//!
//! Constraints
//! - Single-threaded, strictly sequential calls. `apply` takes `&mut self`,
//!   so a hasher cannot reenter the instance it is running under.
//! - One entry per layer; each write supersedes the previous one.
//! - A failed call (guard or hasher) mutates nothing.
//!
//! Identity
//! - `Reference::same_ref` decides identity: `Rc` pointers for shared
//!   allocations, value comparison for primitives of the dynamic `Value`.
//! - The memoizer holds a clone of its last key, which keeps the allocation
//!   alive; an address cannot be recycled while it is still the key.
//!
//! Hashing
//! - `ContentHasher<T>` is a type parameter, defaulting to
//!   `StructuralHasher` (canonical serde encoding into blake3: sorted
//!   keys, normalized float bits, absent tagged apart from null).
//! - The absent value is hashed through `HashInput::Absent`, a variant no
//!   real value can produce.
//!
//! Notes and non-goals
//! - Not a deep-equality library; equality is whatever the hasher says.
//! - Not a multi-entry or persistent cache.
//! - Not `Sync`; share across threads only by giving each its own instance.

mod cache;
mod canonical;
mod config;
mod error;
mod guard;
pub mod hash;
mod memo;
mod preserve;
mod reference;
mod slot;
mod value;

// Public surface
pub use cache::ReferenceCache;
pub use config::{Config, ENV_VAR, PRODUCTION};
pub use error::{Error, Result};
pub use guard::{Advisory, InputGuard};
pub use hash::{ContentHasher, Digest, HashInput, StructuralHasher};
pub use memo::HashMemoizer;
pub use preserve::PreserveReference;
pub use reference::{Kind, Reference};
pub use slot::Slot;
pub use value::{Callable, Value};
