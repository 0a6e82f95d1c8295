//! Namespace-scoped views over ordered key/value stores.
//!
//! A [`ScopedStore`] wraps a parent store and a byte-string prefix. Every key
//! passed to it is prepended with the prefix before reaching the parent, and
//! iterators over it only yield entries under the prefix, with the prefix
//! stripped from their keys.

mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{
    BufStore, Entries, Iter, Limits, MapStore, RawIterator, Read, ScopedIterator, ScopedStore,
    Store, Write, KV,
};
