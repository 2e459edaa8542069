//! Storage Manager
//!
//! Manages the set of segments and the flush protocol.
//!
//! ## Responsibilities
//! - Discover existing segments on startup, skipping unusable files
//! - Hand out per-segment iterators newest → oldest for reads
//! - Create new segments from MemTable flushes
//! - Track the generation counter

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::memtable::MemTable;
use crate::table::{CellIter, Table};

use super::Segment;

/// Manages the storage layer
///
/// Single-threaded: every mutating method takes `&mut self`.
#[derive(Debug)]
pub struct StorageManager {
    /// Directory where segments are stored
    data_dir: PathBuf,

    /// Open segments keyed by generation, ascending
    segments: BTreeMap<u64, Segment>,

    /// Generation the next flush will be written under
    generation: u64,
}

impl StorageManager {
    // =========================================================================
    // Stored-state naming
    // =========================================================================
    const SEGMENT_SUFFIX: &'static str = ".dat";
    const TEMP_SUFFIX: &'static str = ".tmp";

    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Open every `<generation>.dat` file as a segment
    /// 3. Skip (and log) entries whose listing, name or contents are unusable
    /// 4. Resume the generation counter at the highest generation seen
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut segments = BTreeMap::new();
        let mut generation = 0u64;

        for entry in fs::read_dir(path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", path.display(), e);
                    continue;
                }
            };
            let file_path = entry.path();

            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(Self::SEGMENT_SUFFIX) else {
                continue;
            };
            let Some(file_generation) = Self::parse_generation(stem) else {
                tracing::warn!("Skipping {}: not a generation number", file_path.display());
                continue;
            };

            generation = generation.max(file_generation);

            match Segment::open(&file_path) {
                Ok(segment) => {
                    tracing::debug!(
                        "Loaded segment {} ({} rows, {} bytes)",
                        file_generation,
                        segment.row_count(),
                        segment.file_size()
                    );
                    segments.insert(file_generation, segment);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file_path.display(), e);
                }
            }
        }

        Ok(Self {
            data_dir: path.to_path_buf(),
            segments,
            generation,
        })
    }

    /// One iterator per segment starting at `from`, newest generation first
    pub fn iter_sources<'a>(&'a self, from: &[u8]) -> Result<Vec<CellIter<'a>>> {
        self.segments
            .values()
            .rev()
            .map(|segment| Table::iter_from(segment, from))
            .collect()
    }

    /// Flush a MemTable to a new segment
    ///
    /// Writes `<generation>.tmp`, renames it to `<generation>.dat`, opens it
    /// and registers it, then advances the generation counter. Returns the
    /// generation that was written.
    pub fn flush(&mut self, memtable: &MemTable) -> Result<u64> {
        let generation = self.generation;
        let temp_path = self.temp_path(generation);
        let final_path = self.segment_path(generation);

        if let Err(e) = Segment::serialize(&temp_path, memtable.iter(), memtable.entry_count()) {
            // A leftover temp file is ignored at startup, so removal is best-effort
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        fs::rename(&temp_path, &final_path)?;

        let segment = Segment::open(&final_path)?;
        tracing::debug!(
            "Flushed generation {} ({} rows, {} bytes)",
            generation,
            segment.row_count(),
            segment.file_size()
        );

        if let Some(mut replaced) = self.segments.insert(generation, segment) {
            tracing::warn!("Generation {} replaced an existing segment", generation);
            replaced.close()?;
        }
        self.generation += 1;

        Ok(generation)
    }

    /// Close every segment, releasing its file handle
    pub fn close(&mut self) -> Result<()> {
        for segment in self.segments.values_mut() {
            segment.close()?;
        }
        Ok(())
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Generation the next flush will use
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open segments in ascending generation order
    pub fn segments(&self) -> impl Iterator<Item = (u64, &Segment)> + '_ {
        self.segments.iter().map(|(generation, segment)| (*generation, segment))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Final path of the segment with the given generation
    fn segment_path(&self, generation: u64) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", generation, Self::SEGMENT_SUFFIX))
    }

    /// Temporary path used while writing the given generation
    fn temp_path(&self, generation: u64) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", generation, Self::TEMP_SUFFIX))
    }

    /// Parse a generation from a file stem
    /// "42" → Some(42), "garbage" → None
    fn parse_generation(stem: &str) -> Option<u64> {
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        stem.parse().ok()
    }
}
