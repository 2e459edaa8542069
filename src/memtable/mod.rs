//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Absorb every upsert and remove
//! - Track approximate byte footprint for flush triggers
//! - Ordered iteration from any key (reads and segment creation)
//!
//! ## Data Structure Choice
//! BTreeMap keyed by raw bytes in signed-byte order (see `compare_keys`):
//! - Ordered keys (required for segment generation)
//! - O(log n) positioning for range reads
//! - No locking: the engine is single-threaded

mod table;

pub use table::{MemTable, MemTableIterator};
