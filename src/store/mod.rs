//! Ordered key/value store traits and their implementations.

use crate::Result;

pub mod bounds;
pub mod bufstore;
mod error;
pub mod iter;
pub mod mapstore;
pub mod prefix;
pub mod validity;

pub use bufstore::BufStore;
pub use error::Error;
pub use iter::{Entries, RawIterator};
pub use mapstore::MapStore;
pub use prefix::{ScopedIterator, ScopedStore};
pub use validity::Limits;

/// A key/value entry.
pub type KV = (Vec<u8>, Vec<u8>);

/// Point reads from a key/value store.
pub trait Read {
    /// Gets the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Returns whether a value is stored under `key`.
    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Mutations of a key/value store.
pub trait Write {
    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Removes `key`. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Flushes buffered writes into the wrapped store.
    ///
    /// Only write-buffering stores (see [`BufStore`]) implement this
    /// meaningfully. Every other store panics, since calling it means the
    /// caller confused the store with a buffering layer.
    fn write(&mut self) -> Result<()>;

    /// Wraps this store in a [`BufStore`], which buffers writes in memory
    /// until [`Write::write`] is called on it.
    #[inline]
    fn cache_wrap(&mut self) -> BufStore<&mut Self>
    where
        Self: Sized,
    {
        BufStore::wrap(self)
    }
}

/// Ordered iteration over the entries of a key/value store.
///
/// Bounds are always given in ascending terms: `start` is inclusive, `end` is
/// exclusive, and `None` leaves that side unbounded, regardless of the
/// traversal direction.
pub trait Iter: Read {
    type Iter<'a>: RawIterator
    where
        Self: 'a;

    /// Iterates over `[start, end)` in ascending key order.
    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<Self::Iter<'_>>;

    /// Iterates over `[start, end)` in descending key order.
    fn reverse_iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>)
        -> Result<Self::Iter<'_>>;
}

/// A full ordered key/value store.
pub trait Store: Read + Write + Iter {}

impl<S: Read + Write + Iter> Store for S {}

impl<S: Read> Read for &S {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }
}

impl<S: Read> Read for &mut S {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }
}

impl<S: Write> Write for &mut S {
    #[inline]
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).set(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    #[inline]
    fn write(&mut self) -> Result<()> {
        (**self).write()
    }
}

impl<S: Iter> Iter for &S {
    type Iter<'a> = S::Iter<'a> where Self: 'a;

    #[inline]
    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<Self::Iter<'_>> {
        (**self).iterator(start, end)
    }

    #[inline]
    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Self::Iter<'_>> {
        (**self).reverse_iterator(start, end)
    }
}

impl<S: Iter> Iter for &mut S {
    type Iter<'a> = S::Iter<'a> where Self: 'a;

    #[inline]
    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<Self::Iter<'_>> {
        (**self).iterator(start, end)
    }

    #[inline]
    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Self::Iter<'_>> {
        (**self).reverse_iterator(start, end)
    }
}
