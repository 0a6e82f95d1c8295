use super::KV;
use crate::Result;

/// A cursor over the entries of a store, positioned on one entry at a time.
///
/// A freshly created iterator is already positioned on its first entry (if
/// any). Calling [`next`](RawIterator::next), [`key`](RawIterator::key) or
/// [`value`](RawIterator::value) while the iterator is not
/// [`valid`](RawIterator::valid) is a contract violation and panics.
pub trait RawIterator {
    /// The `[start, end)` bounds the iterator was created with.
    fn domain(&self) -> (Option<&[u8]>, Option<&[u8]>);

    /// Returns whether the iterator is positioned on an entry.
    fn valid(&self) -> bool;

    /// Advances to the next entry in iteration order.
    fn next(&mut self) -> Result<()>;

    /// The key of the current entry.
    fn key(&self) -> &[u8];

    /// The value of the current entry.
    fn value(&self) -> &[u8];

    /// Releases the iterator and any resources it holds in its store.
    fn close(self) -> Result<()>
    where
        Self: Sized;

    /// Adapts the iterator into a [`std::iter::Iterator`] over owned entries.
    fn into_entries(self) -> Entries<Self>
    where
        Self: Sized,
    {
        Entries {
            inner: self,
            advance: false,
            done: false,
        }
    }
}

/// A [`std::iter::Iterator`] over the entries of a [`RawIterator`].
///
/// Iteration stops after the first error.
pub struct Entries<I> {
    inner: I,
    advance: bool,
    done: bool,
}

impl<I: RawIterator> Entries<I> {
    /// Closes the underlying [`RawIterator`].
    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}

impl<I: RawIterator> Iterator for Entries<I> {
    type Item = Result<KV>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.advance {
            if let Err(err) = self.inner.next() {
                self.done = true;
                return Some(Err(err));
            }
        }

        if !self.inner.valid() {
            self.done = true;
            return None;
        }

        self.advance = true;
        Some(Ok((self.inner.key().to_vec(), self.inner.value().to_vec())))
    }
}
