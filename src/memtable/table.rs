//! MemTable implementation
//!
//! BTreeMap-based memtable with incremental size accounting.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::Result;
use crate::table::{CellIter, Table};
use crate::value::{Cell, Key, Value};

/// In-memory table for recent writes
#[derive(Debug, Default)]
pub struct MemTable {
    /// Sorted key → latest version
    data: BTreeMap<Key, Value>,
    /// Approximate live footprint in bytes
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the latest version of a key (tombstones included)
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.data.get(&Key(key.to_vec()))
    }

    /// Insert a live value stamped with the current time
    ///
    /// Returns the new footprint.
    ///
    /// Size delta:
    /// - new key: key + value
    /// - previous tombstone: value
    /// - previous live value: value - previous value
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let value_len = value.len();
        let key_len = key.len();
        match self.data.insert(Key(key), Value::live_now(value)) {
            None => self.size += key_len + value_len,
            Some(previous) if previous.is_tombstone() => self.size += value_len,
            Some(previous) => self.size = self.size + value_len - previous.payload_len(),
        }
        self.size
    }

    /// Insert a tombstone stamped with the current time
    ///
    /// Returns the new footprint.
    ///
    /// Size delta:
    /// - new key: key
    /// - previous live value: minus previous value
    /// - previous tombstone: unchanged
    pub fn delete(&mut self, key: Vec<u8>) -> usize {
        let key_len = key.len();
        match self.data.insert(Key(key), Value::tombstone_now()) {
            None => self.size += key_len,
            Some(previous) if previous.is_tombstone() => {}
            Some(previous) => self.size -= previous.payload_len(),
        }
        self.size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if should flush (size > limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size > size_limit
    }

    /// Iterate entries with key >= `from` in sorted key order
    pub fn iter_from(&self, from: &[u8]) -> MemTableIterator<'_> {
        MemTableIterator {
            inner: self
                .data
                .range((Bound::Included(Key(from.to_vec())), Bound::Unbounded)),
        }
    }

    /// Iterate over all entries (for flush)
    pub fn iter(&self) -> MemTableIterator<'_> {
        self.iter_from(&[])
    }
}

impl Table for MemTable {
    fn iter_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>> {
        Ok(Box::new(MemTable::iter_from(self, from).map(Ok)))
    }

    fn upsert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<()> {
        self.delete(key.to_vec());
        Ok(())
    }

    fn size_in_bytes(&self) -> u64 {
        self.size as u64
    }

    fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Nothing is held open; closing is a no-op.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Iterator over MemTable entries, building a fresh cell per entry
pub struct MemTableIterator<'a> {
    inner: btree_map::Range<'a, Key, Value>,
}

impl Iterator for MemTableIterator<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| Cell::new(key.0.clone(), value.clone()))
    }
}
