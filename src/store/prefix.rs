use log::trace;

use super::bounds::{concat, strip_prefix, translate_range};
use super::*;

/// A `Store` which wraps another `Store` and prepends a prefix to the key for
/// every read or write.
///
/// This can be useful to create a hierarchy of data within a single store -
/// effectively namespacing the keys to prevent key conflicts. Iterators over a
/// `ScopedStore` only visit keys under its prefix, and yield them with the
/// prefix removed.
///
/// The parent is usually borrowed (`&mut S` for read/write access, `&S` for
/// read-only access), so the `ScopedStore` never owns the parent's lifecycle.
#[derive(Clone, Debug)]
pub struct ScopedStore<S> {
    parent: S,
    prefix: Vec<u8>,
    limits: Limits,
}

impl<S> ScopedStore<S> {
    /// Constructs a `ScopedStore` by wrapping the given store and prepending
    /// keys with the given prefix for all operations. The prefix may be empty.
    pub fn new(parent: S, prefix: Vec<u8>) -> Self {
        ScopedStore {
            parent,
            prefix,
            limits: Default::default(),
        }
    }

    /// Replaces the validity limits applied to logical keys and values on
    /// `set`.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[inline]
    pub fn prefix(&self) -> &[u8] {
        self.prefix.as_slice()
    }

    #[inline]
    pub fn parent(&self) -> &S {
        &self.parent
    }

    /// Consumes the `ScopedStore` and returns the wrapped parent.
    pub fn into_inner(self) -> S {
        self.parent
    }

    #[inline]
    fn key(&self, key: &[u8]) -> Vec<u8> {
        concat(self.prefix.as_slice(), key)
    }
}

impl<S: Read> Read for ScopedStore<S> {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.parent.get(self.key(key).as_slice())
    }

    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool> {
        self.parent.has(self.key(key).as_slice())
    }
}

impl<S: Write> Write for ScopedStore<S> {
    #[inline]
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.limits.validate(&key, &value)?;
        let prefixed = self.key(key.as_slice());
        self.parent.set(prefixed, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let prefixed = self.key(key);
        self.parent.delete(prefixed.as_slice())
    }

    fn write(&mut self) -> Result<()> {
        panic!("unexpected write() on ScopedStore")
    }
}

impl<S: Iter> Iter for ScopedStore<S> {
    type Iter<'a> = ScopedIterator<S::Iter<'a>> where Self: 'a;

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<Self::Iter<'_>> {
        let (parent_start, parent_end) = translate_range(self.prefix(), start, end);
        trace!(
            "Scoped iterator over [{}, {})",
            hex::encode(&parent_start),
            parent_end.as_deref().map_or("..".into(), hex::encode)
        );

        let iter = self
            .parent
            .iterator(Some(parent_start.as_slice()), parent_end.as_deref())?;
        Ok(ScopedIterator::new(self.prefix.clone(), start, end, iter))
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Self::Iter<'_>> {
        let (parent_start, parent_end) = translate_range(self.prefix(), start, end);
        trace!(
            "Scoped reverse iterator over [{}, {})",
            hex::encode(&parent_start),
            parent_end.as_deref().map_or("..".into(), hex::encode)
        );

        let iter = self
            .parent
            .reverse_iterator(Some(parent_start.as_slice()), parent_end.as_deref())?;
        Ok(ScopedIterator::new(self.prefix.clone(), start, end, iter))
    }
}

/// An iterator over the entries of a [`ScopedStore`].
///
/// Wraps an iterator over the parent store and strips the prefix from every
/// key. Once the parent moves to a key outside of the prefix the iterator
/// becomes invalid, and stays invalid.
pub struct ScopedIterator<I> {
    prefix: Vec<u8>,
    start: Option<Vec<u8>>,
    end: Option<Vec<u8>>,
    parent: I,
    valid: bool,
}

impl<I: RawIterator> ScopedIterator<I> {
    /// Wraps `parent`, which must already be positioned at the start of the
    /// translated range. `start` and `end` are the logical bounds, reported by
    /// `domain`.
    pub fn new(prefix: Vec<u8>, start: Option<&[u8]>, end: Option<&[u8]>, parent: I) -> Self {
        let valid = parent.valid() && parent.key().starts_with(&prefix);
        ScopedIterator {
            prefix,
            start: start.map(<[u8]>::to_vec),
            end: end.map(<[u8]>::to_vec),
            parent,
            valid,
        }
    }

    #[inline]
    fn assert_valid(&self, op: &str) {
        if !self.valid {
            panic!("ScopedIterator invalid, cannot call {}()", op);
        }
    }
}

impl<I: RawIterator> RawIterator for ScopedIterator<I> {
    fn domain(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        (self.start.as_deref(), self.end.as_deref())
    }

    #[inline]
    fn valid(&self) -> bool {
        self.valid && self.parent.valid()
    }

    fn next(&mut self) -> Result<()> {
        self.assert_valid("next");
        self.parent.next()?;

        if !self.parent.valid() || !self.parent.key().starts_with(&self.prefix) {
            trace!("Scoped iterator left prefix {}", hex::encode(&self.prefix));
            self.valid = false;
        }
        Ok(())
    }

    fn key(&self) -> &[u8] {
        self.assert_valid("key");
        strip_prefix(self.parent.key(), &self.prefix)
    }

    fn value(&self) -> &[u8] {
        self.assert_valid("value");
        self.parent.value()
    }

    fn close(self) -> Result<()> {
        self.parent.close()
    }
}
