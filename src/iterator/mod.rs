//! Iterator Module
//!
//! Read-path plumbing: the priority-aware k-way merge, collapsing of
//! duplicate keys and tombstone filtering.

mod merge;

pub use merge::MergeIterator;

use crate::error::Result;
use crate::value::Cell;

/// Keeps only the first cell of every run of equal keys
pub struct CollapseEquals<I> {
    inner: I,
    last_key: Option<Vec<u8>>,
}

impl<I> CollapseEquals<I>
where
    I: Iterator<Item = Result<Cell>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            last_key: None,
        }
    }
}

impl<I> Iterator for CollapseEquals<I>
where
    I: Iterator<Item = Result<Cell>>,
{
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cell = match self.inner.next()? {
                Ok(cell) => cell,
                Err(e) => return Some(Err(e)),
            };
            if self.last_key.as_deref() == Some(cell.key()) {
                continue;
            }
            self.last_key = Some(cell.key().to_vec());
            return Some(Ok(cell));
        }
    }
}

/// Live key/value pairs from a merged read, ascending by key
///
/// Single-pass; stale versions and tombstoned keys never appear.
pub struct RangeIter<'a> {
    inner: CollapseEquals<MergeIterator<'a>>,
}

impl<'a> RangeIter<'a> {
    pub fn new(merge: MergeIterator<'a>) -> Self {
        Self {
            inner: CollapseEquals::new(merge),
        }
    }
}

impl Iterator for RangeIter<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, value) = match self.inner.next()? {
                Ok(cell) => cell.into_parts(),
                Err(e) => return Some(Err(e)),
            };
            if let Some(payload) = value.into_payload() {
                return Some(Ok((key, payload)));
            }
        }
    }
}
