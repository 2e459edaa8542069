//! Segment Module
//!
//! Immutable on-disk sorted table produced by a single memtable flush.
//!
//! ## File Format
//! All integers are big-endian. Keys are ordered by `compare_keys`
//! (signed bytes), which fixes the record order below.
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Records (variable), ascending key order                 │
//! │   [KeyLen: i32][Key][Timestamp: i64]                    │
//! │   followed by [ValLen: i32][Value] when Timestamp >= 0  │
//! │   (a tombstone stores the negated timestamp, no value)  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offset Index (8 * RowCount bytes)                       │
//! │   [Offset: i64] absolute start of each record           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   RowCount: i32                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod iterator;
mod reader;

pub use builder::SegmentBuilder;
pub use iterator::SegmentIterator;
pub use reader::Segment;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Size of a key or value length prefix
pub(crate) const LEN_SIZE: u64 = 4;

/// Size of the signed timestamp field
pub(crate) const TIMESTAMP_SIZE: u64 = 8;

/// Size of one offset index entry
pub(crate) const OFFSET_SIZE: u64 = 8;

/// Footer size: RowCount (4)
pub(crate) const FOOTER_SIZE: u64 = 4;
