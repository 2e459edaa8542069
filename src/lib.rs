//! # Strata
//!
//! An embeddable, ordered key-value storage engine built on the
//! log-structured-merge pattern:
//! - Writes land in a sorted in-memory table
//! - Past a size threshold the table is flushed to an immutable segment
//! - Reads merge the memtable with every segment, freshest version wins
//! - Deletes are tombstones until they fall out of the merge
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │              put / delete / get_range / close                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌────────────────┐
//!   │  MemTable   │  flush   │ StorageManager │
//!   │ (BTreeMap)  │ ───────▶ │  0.dat 1.dat … │
//!   └──────┬──────┘          └───────┬────────┘
//!          │                         │
//!          └──────────┬──────────────┘
//!                     ▼
//!            ┌─────────────────┐
//!            │  MergeIterator  │
//!            │ collapse+filter │
//!            └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod table;
pub mod memtable;
pub mod storage;
pub mod iterator;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StrataError, Result};
pub use config::Config;
pub use engine::Engine;
pub use table::Table;
pub use value::{compare_keys, Cell, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
