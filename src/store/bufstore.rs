use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap};

use log::debug;

use super::bounds::range_bounds;
use super::*;

/// An in-memory map containing values modified by writes to a `BufStore`.
pub type Map = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Wraps a `Store` and records mutations in an in-memory map, so that
/// modifications do not affect the underlying `Store` until `write` is called.
pub struct BufStore<S> {
    map: Map,
    store: S,
    limits: Limits,
}

impl<S> BufStore<S> {
    /// Constructs a `BufStore` by wrapping the given store.
    ///
    /// Calls to get will first check the `BufStore` map, and if no entry is
    /// found will be passed to the underlying store.
    pub fn wrap(store: S) -> Self {
        BufStore {
            store,
            map: Default::default(),
            limits: Default::default(),
        }
    }

    /// Creates a `BufStore` by wrapping the given store, using a pre-populated
    /// in-memory buffer of key/value entries.
    pub fn wrap_with_map(store: S, map: Map) -> Self {
        BufStore {
            store,
            map,
            limits: Default::default(),
        }
    }

    /// Replaces the validity limits applied on `set`.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Consumes the `BufStore` and returns its in-memory buffer of key/value
    /// entries.
    pub fn into_map(self) -> Map {
        self.map
    }

    /// Consumes the `BufStore`, discarding any buffered writes, and returns
    /// the wrapped store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: Read> Read for BufStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.map.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.store.get(key),
        }
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        match self.map.get(key) {
            Some(value) => Ok(value.is_some()),
            None => self.store.has(key),
        }
    }
}

impl<S: Write> Write for BufStore<S> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.limits.validate(&key, &value)?;
        self.map.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.insert(key.to_vec(), None);
        Ok(())
    }

    /// Writes all of the `BufStore`'s buffered values to the underlying
    /// store, in key order.
    ///
    /// The in-memory buffer is only cleared once every entry was accepted by
    /// the underlying store. If the store fails partway, the whole buffer is
    /// kept, so `get` still sees every buffered write and a later `write` can
    /// retry it.
    fn write(&mut self) -> Result<()> {
        debug!("Writing {} buffered entries", self.map.len());
        for (key, value) in self.map.iter() {
            match value {
                Some(value) => self.store.set(key.clone(), value.clone())?,
                None => self.store.delete(key.as_slice())?,
            }
        }
        self.map.clear();
        Ok(())
    }
}

impl<S: Iter> Iter for BufStore<S> {
    type Iter<'a> = BufIter<'a, S::Iter<'a>> where Self: 'a;

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<Self::Iter<'_>> {
        let map_iter = self.map.range::<[u8], _>(range_bounds(start, end));
        let backing_iter = self.store.iterator(start, end)?;
        BufIter::new(map_iter, backing_iter, false)
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Self::Iter<'_>> {
        let map_iter = self.map.range::<[u8], _>(range_bounds(start, end));
        let backing_iter = self.store.reverse_iterator(start, end)?;
        BufIter::new(map_iter, backing_iter, true)
    }
}

type MapRange<'a> = btree_map::Range<'a, Vec<u8>, Option<Vec<u8>>>;
type MapEntry<'a> = (&'a [u8], Option<&'a [u8]>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Map,
    Backing,
}

/// An iterator implementation over entries in a `BufStore`.
///
/// Entries will be emitted for values in the underlying store, reflecting the
/// modifications stored in the in-memory map.
pub struct BufIter<'a, B> {
    map_iter: MapRange<'a>,
    map_entry: Option<MapEntry<'a>>,
    backing_iter: B,
    reverse: bool,
    current: Option<Source>,
}

impl<'a, B: RawIterator> BufIter<'a, B> {
    fn new(map_iter: MapRange<'a>, backing_iter: B, reverse: bool) -> Result<Self> {
        let mut iter = BufIter {
            map_iter,
            map_entry: None,
            backing_iter,
            reverse,
            current: None,
        };
        iter.step_map();
        iter.settle()?;
        Ok(iter)
    }

    fn step_map(&mut self) {
        let entry = if self.reverse {
            self.map_iter.next_back()
        } else {
            self.map_iter.next()
        };
        self.map_entry = entry.map(|(key, value)| (key.as_slice(), value.as_deref()));
    }

    /// Positions `current` on the next entry to emit, skipping buffered
    /// deletes and backing entries shadowed by the map.
    fn settle(&mut self) -> Result<()> {
        loop {
            let (map_key, map_value) = match self.map_entry {
                // consumed map iterator, emit backing values until exhausted
                None => {
                    self.current = self.backing_iter.valid().then_some(Source::Backing);
                    return Ok(());
                }
                Some(entry) => entry,
            };

            if self.backing_iter.valid() {
                let mut key_cmp = map_key.cmp(self.backing_iter.key());
                if self.reverse {
                    key_cmp = key_cmp.reverse();
                }

                // backing key comes first, emit backing entry
                if key_cmp == Ordering::Greater {
                    self.current = Some(Source::Backing);
                    return Ok(());
                }

                // map entry shadows backing entry
                if key_cmp == Ordering::Equal {
                    self.backing_iter.next()?;
                }
            }

            // map entry comes first, emit it (or skip if delete)
            if map_value.is_some() {
                self.current = Some(Source::Map);
                return Ok(());
            }
            self.step_map();
        }
    }

    fn source(&self, op: &str) -> Source {
        match self.current {
            Some(source) => source,
            None => panic!("BufIter invalid, cannot call {}()", op),
        }
    }
}

impl<'a, B: RawIterator> RawIterator for BufIter<'a, B> {
    fn domain(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        self.backing_iter.domain()
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        match self.source("next") {
            Source::Map => self.step_map(),
            Source::Backing => self.backing_iter.next()?,
        }
        self.settle()
    }

    fn key(&self) -> &[u8] {
        match (self.source("key"), self.map_entry) {
            (Source::Map, Some((key, _))) => key,
            _ => self.backing_iter.key(),
        }
    }

    fn value(&self) -> &[u8] {
        match (self.source("value"), self.map_entry) {
            (Source::Map, Some((_, Some(value)))) => value,
            _ => self.backing_iter.value(),
        }
    }

    fn close(self) -> Result<()> {
        self.backing_iter.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<I: RawIterator>(iter: I) -> Vec<KV> {
        iter.into_entries().collect::<Result<_>>().unwrap()
    }

    fn backing() -> MapStore {
        let mut store = MapStore::new();
        store.set(vec![0], vec![0]).unwrap();
        store.set(vec![1], vec![0]).unwrap();
        store.set(vec![2], vec![0]).unwrap();
        store.set(vec![4], vec![0]).unwrap();
        store
    }

    #[test]
    fn satisfies_store_trait() {
        // (this is a compile-time assertion)
        fn assert_store<S: Store>(_: S) {}
        assert_store(BufStore::wrap(MapStore::new()));
    }

    #[test]
    fn get_slice() {
        let mut store = BufStore::wrap(MapStore::new());
        store.set(vec![1, 2, 3], vec![4, 5, 6]).unwrap();
        let value = store.get(&[1, 2, 3]).unwrap();
        assert_eq!(value, Some(vec![4, 5, 6]));
        assert!(store.has(&[1, 2, 3]).unwrap());
    }

    #[test]
    fn delete() {
        let mut store = BufStore::wrap(backing());
        store.delete(&[1]).unwrap();
        assert_eq!(store.get(&[1]).unwrap(), None);
        assert!(!store.has(&[1]).unwrap());
        assert_eq!(store.into_inner().get(&[1]).unwrap(), Some(vec![0]));
    }

    #[test]
    fn set_validates() {
        let mut store = BufStore::wrap(MapStore::new()).with_limits(Limits {
            max_key_len: 2,
            ..Default::default()
        });
        assert!(store.set(vec![1, 2, 3], vec![1]).is_err());
        store.set(vec![], vec![1]).unwrap();
        let map: Vec<_> = store.into_map().into_iter().collect();
        assert_eq!(map, vec![(vec![], Some(vec![1]))]);
    }

    #[test]
    fn wrap_with_map() {
        let mut map = Map::new();
        map.insert(vec![1], Some(vec![1]));
        map.insert(vec![2], None);
        map.insert(vec![3], Some(vec![1]));

        let mut backing = backing();
        let mut buf = BufStore::wrap_with_map(&mut backing, map);
        assert_eq!(buf.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(buf.get(&[2]).unwrap(), None);
        assert_eq!(
            collect(buf.iterator(None, None).unwrap()),
            vec![
                (vec![0], vec![0]),
                (vec![1], vec![1]),
                (vec![3], vec![1]),
                (vec![4], vec![0]),
            ]
        );

        buf.write().unwrap();
        assert_eq!(backing.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(backing.get(&[2]).unwrap(), None);
        assert_eq!(backing.get(&[3]).unwrap(), Some(vec![1]));
    }

    #[test]
    fn write() {
        let mut backing = backing();
        let mut buf = backing.cache_wrap();
        buf.set(vec![1], vec![1]).unwrap();
        buf.delete(&[2]).unwrap();
        buf.set(vec![3], vec![1]).unwrap();
        assert_eq!(buf.store.get(&[1]).unwrap(), Some(vec![0]));

        buf.write().unwrap();
        assert!(buf.map.is_empty());
        // writing an empty buffer is a no-op
        buf.write().unwrap();

        assert_eq!(backing.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(backing.get(&[2]).unwrap(), None);
        assert_eq!(backing.get(&[3]).unwrap(), Some(vec![1]));
        assert_eq!(backing.get(&[4]).unwrap(), Some(vec![0]));
    }

    #[test]
    fn write_failure_keeps_buffer() {
        let mut backing = MapStore::new().with_limits(Limits {
            max_key_len: 2,
            ..Default::default()
        });
        let mut cache = backing.cache_wrap();
        cache.set(b"abc".to_vec(), vec![1]).unwrap();
        cache.set(b"b".to_vec(), vec![2]).unwrap();

        assert!(cache.write().is_err());
        assert_eq!(cache.get(b"abc").unwrap(), Some(vec![1]));
        assert_eq!(cache.get(b"b").unwrap(), Some(vec![2]));
        assert_eq!(cache.map.len(), 2);

        // the entry is dropped from the buffer, the retry goes through
        cache.delete(b"abc").unwrap();
        cache.write().unwrap();
        assert!(cache.map.is_empty());
        assert_eq!(backing.get(b"b").unwrap(), Some(vec![2]));
        assert_eq!(backing.get(b"abc").unwrap(), None);
    }

    #[test]
    fn iter() {
        let mut buf = BufStore::wrap(backing());
        buf.set(vec![1], vec![1]).unwrap();
        buf.delete(&[2]).unwrap();
        buf.set(vec![3], vec![1]).unwrap();

        let expected = vec![
            (vec![0], vec![0]),
            (vec![1], vec![1]),
            (vec![3], vec![1]),
            (vec![4], vec![0]),
        ];
        assert_eq!(collect(buf.iterator(None, None).unwrap()), expected);

        let mut reversed = expected;
        reversed.reverse();
        assert_eq!(collect(buf.reverse_iterator(None, None).unwrap()), reversed);
    }

    #[test]
    fn iter_bounds() {
        let mut buf = BufStore::wrap(backing());
        buf.set(vec![3], vec![1]).unwrap();
        buf.set(vec![5], vec![1]).unwrap();

        let iter = buf.iterator(Some(&[2][..]), Some(&[5][..])).unwrap();
        assert_eq!(iter.domain(), (Some(&[2][..]), Some(&[5][..])));
        assert_eq!(
            collect(iter),
            vec![(vec![2], vec![0]), (vec![3], vec![1]), (vec![4], vec![0])]
        );

        let iter = buf.reverse_iterator(Some(&[3][..]), None).unwrap();
        assert_eq!(
            collect(iter),
            vec![(vec![5], vec![1]), (vec![4], vec![0]), (vec![3], vec![1])]
        );
    }

    #[test]
    fn iter_all_deleted() {
        let mut buf = BufStore::wrap(backing());
        for key in [0, 1, 2, 4, 9] {
            buf.delete(&[key]).unwrap();
        }
        assert!(!buf.iterator(None, None).unwrap().valid());
        assert!(!buf.reverse_iterator(None, None).unwrap().valid());
    }

    #[test]
    fn iter_empty_backing() {
        let mut buf = BufStore::wrap(MapStore::new());
        buf.set(vec![2], vec![2]).unwrap();
        buf.delete(&[3]).unwrap();
        buf.set(vec![1], vec![1]).unwrap();

        assert_eq!(
            collect(buf.iterator(None, None).unwrap()),
            vec![(vec![1], vec![1]), (vec![2], vec![2])]
        );
    }

    #[test]
    #[should_panic(expected = "BufIter invalid, cannot call key()")]
    fn key_past_end() {
        let buf = BufStore::wrap(MapStore::new());
        let iter = buf.iterator(None, None).unwrap();
        iter.key();
    }
}
