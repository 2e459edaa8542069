//! Table capability
//!
//! Common contract shared by the mutable [`MemTable`](crate::memtable::MemTable)
//! and the immutable on-disk [`Segment`](crate::storage::Segment).

use crate::error::Result;
use crate::value::Cell;

/// Lazy, key-ordered sequence of cells produced by a table
pub type CellIter<'a> = Box<dyn Iterator<Item = Result<Cell>> + 'a>;

/// A source of key-ordered cells
pub trait Table {
    /// Cells with key >= `from`, ascending.
    ///
    /// Positioning must not be linear in the table size.
    fn iter_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>>;

    /// Insert or overwrite a live value
    fn upsert(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Record a deletion
    fn remove(&mut self, key: &[u8]) -> Result<()>;

    /// Approximate footprint in bytes
    fn size_in_bytes(&self) -> u64;

    /// Number of rows (tombstones included)
    fn row_count(&self) -> usize;

    /// Release any resources held by the table
    fn close(&mut self) -> Result<()>;
}
