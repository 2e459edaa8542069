//! K-way merge over sorted cell sources
//!
//! Sources are ordered by priority: index 0 is the freshest (the memtable),
//! higher indices are older segments. Among cells with equal keys the one
//! from the lowest source index is always yielded first, so a downstream
//! "keep the first of each key" pass retains the freshest version.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::table::CellIter;
use crate::value::Cell;
use crate::StrataError;

/// Head cell of one source, tagged with that source's priority
struct HeapEntry {
    cell: Cell,
    source: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order: BinaryHeap is a max-heap
        other
            .cell
            .cmp_key(&self.cell)
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// Merges multiple sorted sources into one ascending stream.
///
/// Ordering guarantee: (key ASC, source priority ASC). Duplicates are not
/// removed here; see [`CollapseEquals`](super::CollapseEquals).
pub struct MergeIterator<'a> {
    sources: Vec<CellIter<'a>>,
    heap: BinaryHeap<HeapEntry>,
    /// Error hit while refilling, reported on the next call
    pending: Option<StrataError>,
    /// Set after an error has been yielded
    done: bool,
}

impl<'a> MergeIterator<'a> {
    /// Build the merge, pulling the first cell from every source
    pub fn new(mut sources: Vec<CellIter<'a>>) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, iter) in sources.iter_mut().enumerate() {
            if let Some(cell) = iter.next().transpose()? {
                heap.push(HeapEntry { cell, source });
            }
        }

        Ok(Self {
            sources,
            heap,
            pending: None,
            done: false,
        })
    }
}

impl Iterator for MergeIterator<'_> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(e) = self.pending.take() {
            self.done = true;
            return Some(Err(e));
        }

        let HeapEntry { cell, source } = self.heap.pop()?;
        match self.sources[source].next() {
            Some(Ok(next)) => self.heap.push(HeapEntry { cell: next, source }),
            Some(Err(e)) => self.pending = Some(e),
            None => {}
        }

        Some(Ok(cell))
    }
}
