//! Storage Module
//!
//! Persistent storage layer built from immutable sorted segments.
//!
//! ## Responsibilities
//! - Persist flushed memtables as segment files
//! - Logarithmic seek into each segment via its offset index
//! - Track segments by generation (higher = newer)
//! - Crash-safe flush through write-to-temp then atomic rename
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── 0.dat        generation 0
//!   ├── 1.dat        generation 1
//!   └── 2.tmp        flush in progress (ignored at startup)
//! ```

mod manager;
mod segment;

pub use manager::StorageManager;
pub use segment::{Segment, SegmentBuilder, SegmentIterator};
