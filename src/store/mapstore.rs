use std::collections::btree_map::{self, BTreeMap};

use super::bounds::range_bounds;
use super::*;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// A simple `Store` implementation which keeps its entries in an in-memory
/// ordered map.
#[derive(Default, Clone, Debug)]
pub struct MapStore {
    map: Map,
    limits: Limits,
}

impl MapStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the validity limits applied on `set`.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> MapRange<'_> {
        self.map.range::<[u8], _>(range_bounds(start, end))
    }
}

impl Read for MapStore {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.map.contains_key(key))
    }
}

impl Write for MapStore {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.limits.validate(&key, &value)?;
        self.map.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        panic!("unexpected write() on MapStore")
    }
}

impl Iter for MapStore {
    type Iter<'a> = MapIter<'a>;

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<MapIter<'_>> {
        Ok(MapIter::new(self.range(start, end), start, end, false))
    }

    fn reverse_iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<MapIter<'_>> {
        Ok(MapIter::new(self.range(start, end), start, end, true))
    }
}

type MapRange<'a> = btree_map::Range<'a, Vec<u8>, Vec<u8>>;

/// An iterator over a range of entries in a `MapStore`.
pub struct MapIter<'a> {
    range: MapRange<'a>,
    current: Option<(&'a Vec<u8>, &'a Vec<u8>)>,
    reverse: bool,
    start: Option<Vec<u8>>,
    end: Option<Vec<u8>>,
}

impl<'a> MapIter<'a> {
    fn new(
        range: MapRange<'a>,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        reverse: bool,
    ) -> Self {
        let mut iter = MapIter {
            range,
            current: None,
            reverse,
            start: start.map(<[u8]>::to_vec),
            end: end.map(<[u8]>::to_vec),
        };
        iter.step();
        iter
    }

    #[inline]
    fn step(&mut self) {
        self.current = if self.reverse {
            self.range.next_back()
        } else {
            self.range.next()
        };
    }

    #[inline]
    fn current(&self, op: &str) -> (&'a Vec<u8>, &'a Vec<u8>) {
        match self.current {
            Some(entry) => entry,
            None => panic!("MapIter invalid, cannot call {}()", op),
        }
    }
}

impl<'a> RawIterator for MapIter<'a> {
    fn domain(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        (self.start.as_deref(), self.end.as_deref())
    }

    #[inline]
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        self.current("next");
        self.step();
        Ok(())
    }

    fn key(&self) -> &[u8] {
        self.current("key").0
    }

    fn value(&self) -> &[u8] {
        self.current("value").1
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}
