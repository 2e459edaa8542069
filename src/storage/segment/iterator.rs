//! Segment Iterator
//!
//! Lazy ascending iteration over a segment, one record per advance.

use crate::error::Result;
use crate::value::Cell;

use super::reader::Segment;

/// Iterator over segment cells in sorted key order
///
/// Records are contiguous, so after the initial index lookup each step
/// continues from where the previous record ended.
pub struct SegmentIterator<'a> {
    segment: &'a Segment,
    /// Next row to yield
    row: u32,
    /// File offset of that row's record
    offset: u64,
    /// Set after an error; the iterator yields nothing further
    failed: bool,
}

impl<'a> SegmentIterator<'a> {
    pub(super) fn new(segment: &'a Segment, row: u32, offset: u64) -> Self {
        Self {
            segment,
            row,
            offset,
            failed: false,
        }
    }
}

impl Iterator for SegmentIterator<'_> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.row >= self.segment.row_count() {
            return None;
        }

        match self.segment.record_at(self.offset) {
            Ok((cell, next_offset)) => {
                self.row += 1;
                self.offset = next_offset;
                Some(Ok(cell))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segment.row_count().saturating_sub(self.row) as usize;
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(remaining))
        }
    }
}
