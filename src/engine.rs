//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Route writes to the MemTable
//! - Trigger flushes when the MemTable grows past its limit
//! - Serve merged range reads over MemTable + segments
//! - Load existing segments on startup

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::iterator::{MergeIterator, RangeIter};
use crate::memtable::MemTable;
use crate::storage::StorageManager;
use crate::table::{CellIter, Table};

/// The main storage engine
///
/// ## Concurrency Model: single-threaded
///
/// - Writes (put/delete/flush) take `&mut self` and run synchronously; a
///   write that crosses the flush threshold flushes before returning
/// - Reads borrow `&self`, so no write can happen while a range
///   iterator is alive
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory table for recent writes
    memtable: MemTable,

    /// Persistent segments and the generation counter
    storage: StorageManager,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config (flush threshold must be positive)
    /// 2. Open/create data directory and load existing segments
    /// 3. Start with an empty MemTable
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let storage = StorageManager::open(&config.data_dir)?;

        tracing::info!(
            "Opened {} with {} segments, next generation {}",
            config.data_dir.display(),
            storage.segment_count(),
            storage.generation()
        );

        Ok(Self {
            config,
            memtable: MemTable::new(),
            storage,
        })
    }

    /// Open with a path and flush threshold (convenience method)
    pub fn open_path(path: &Path, memtable_size_limit: usize) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .memtable_size_limit(memtable_size_limit)
            .build();
        Self::open(config)
    }

    /// Iterate live key/value pairs with key >= `from`
    ///
    /// Sources are merged in priority order: MemTable first, then segments
    /// from newest generation to oldest. For each key only the freshest
    /// version is considered, and deleted keys are skipped.
    pub fn get_range(&self, from: &[u8]) -> Result<RangeIter<'_>> {
        let mut sources: Vec<CellIter<'_>> = Vec::with_capacity(self.storage.segment_count() + 1);
        sources.push(Table::iter_from(&self.memtable, from)?);
        sources.extend(self.storage.iter_sources(from)?);

        Ok(RangeIter::new(MergeIterator::new(sources)?))
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.get_range(key)?.next() {
            Some(Ok((found, value))) if found == key => Ok(Some(value)),
            Some(Err(e)) => Err(e),
            _ => Ok(None),
        }
    }

    /// Put a key-value pair
    ///
    /// Flushes synchronously if the MemTable footprint exceeds the limit.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.memtable.put(key.to_vec(), value.to_vec());
        self.maybe_flush()
    }

    /// Delete a key (writes a tombstone)
    ///
    /// Flushes synchronously if the MemTable footprint exceeds the limit.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.memtable.delete(key.to_vec());
        self.maybe_flush()
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size; does nothing if the
    /// memtable is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        self.flush_internal()
    }

    /// Close the engine
    ///
    /// Flushes any pending data, then releases every segment file handle.
    pub fn close(mut self) -> Result<()> {
        if !self.memtable.is_empty() {
            self.flush_internal()?;
        }
        self.storage.close()?;

        tracing::info!("Closed {}", self.config.data_dir.display());
        Ok(())
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.memtable.should_flush(self.config.memtable_size_limit) {
            self.flush_internal()?;
        }
        Ok(())
    }

    /// Write the memtable out as the next generation and start a fresh one
    fn flush_internal(&mut self) -> Result<()> {
        let entries = self.memtable.entry_count();
        let bytes = self.memtable.size();

        let generation = self.storage.flush(&self.memtable)?;
        self.memtable = MemTable::new();

        tracing::info!(
            "Flushed {} entries ({} bytes) to generation {}",
            entries,
            bytes,
            generation
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.storage.segment_count()
    }

    /// Generation the next flush will be written under
    pub fn generation(&self) -> u64 {
        self.storage.generation()
    }

    /// Get the storage manager
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
