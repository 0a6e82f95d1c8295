//! Byte-string arithmetic for prefixed keys and key ranges.

use std::ops::Bound;

/// Concatenates two byte strings into a newly allocated key.
#[inline]
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(a.len() + b.len());
    value.extend_from_slice(a);
    value.extend_from_slice(b);
    value
}

/// Returns the smallest byte string which is greater than every byte string
/// starting with `prefix`, or `None` if no such bound exists (the prefix is
/// empty or made up entirely of `0xFF` bytes).
///
/// ```
/// use prefixstore::store::bounds::prefix_end;
///
/// assert_eq!(prefix_end(b"ab"), Some(b"ac".to_vec()));
/// assert_eq!(prefix_end(&[1, 0xff]), Some(vec![2]));
/// assert_eq!(prefix_end(&[0xff, 0xff]), None);
/// assert_eq!(prefix_end(&[]), None);
/// ```
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|byte| *byte != 0xff)?;
    let mut end = prefix[..=last].to_vec();
    end[last] += 1;
    Some(end)
}

/// Removes `prefix` from the front of `key`.
///
/// Panics if `key` does not start with `prefix`.
#[inline]
pub fn strip_prefix<'a>(key: &'a [u8], prefix: &[u8]) -> &'a [u8] {
    match key.strip_prefix(prefix) {
        Some(suffix) => suffix,
        None => panic!(
            "key {} does not start with prefix {}",
            hex::encode(key),
            hex::encode(prefix)
        ),
    }
}

/// Maps a logical `[start, end)` range under `prefix` onto the parent's key
/// space.
///
/// A missing `start` becomes the prefix itself. A missing `end` becomes
/// [`prefix_end`] of the prefix, which is itself `None` (unbounded) for empty
/// and all-`0xFF` prefixes.
pub fn translate_range(
    prefix: &[u8],
    start: Option<&[u8]>,
    end: Option<&[u8]>,
) -> (Vec<u8>, Option<Vec<u8>>) {
    let start = concat(prefix, start.unwrap_or_default());
    let end = match end {
        Some(end) => Some(concat(prefix, end)),
        None => prefix_end(prefix),
    };
    (start, end)
}

/// Converts optional `[start, end)` bounds into range bounds for an ordered
/// map. Inverted ranges collapse to an empty range starting at `start`.
pub fn range_bounds<'a>(
    start: Option<&'a [u8]>,
    end: Option<&'a [u8]>,
) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    let lower = start.map_or(Bound::Unbounded, Bound::Included);
    let upper = match (start, end) {
        (Some(start), Some(end)) if end < start => Bound::Excluded(start),
        (_, end) => end.map_or(Bound::Unbounded, Bound::Excluded),
    };
    (lower, upper)
}
