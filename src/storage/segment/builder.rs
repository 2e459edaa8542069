//! Segment Builder
//!
//! Writes sorted cells to a new segment file in a single forward pass.

use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

use crate::error::Result;
use crate::value::{compare_keys, Cell};
use crate::StrataError;

use super::{Segment, FOOTER_SIZE, OFFSET_SIZE};

/// Builder for creating new segments from sorted cells
pub struct SegmentBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of records written
    entry_count: u32,
    /// Current write position (start of the next record)
    current_offset: u64,
    /// Offset index, written after the last record
    offsets: BytesMut,
    /// Scratch buffer for encoding one record
    record: BytesMut,
    /// Last key written, for the ordering check
    last_key: Option<Vec<u8>>,
}

impl SegmentBuilder {
    /// Create a new segment builder
    ///
    /// Truncates any existing file at `path`; call `add()` in strictly
    /// ascending key order, then `finish()` to write index and footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entry_count: 0,
            current_offset: 0,
            offsets: BytesMut::new(),
            record: BytesMut::new(),
            last_key: None,
        })
    }

    /// Append one record (must be called in sorted key order)
    pub fn add(&mut self, cell: &Cell) -> Result<()> {
        let key = cell.key();
        if let Some(last) = &self.last_key {
            if compare_keys(last, key) != Ordering::Less {
                return Err(StrataError::Storage(format!(
                    "segment keys out of order in {}",
                    self.path.display()
                )));
            }
        }
        if self.entry_count == i32::MAX as u32 {
            return Err(StrataError::Storage(
                "segment row count exceeds i32::MAX".to_string(),
            ));
        }

        let value = cell.value();
        self.record.clear();
        self.record.put_i32(encode_len(key.len(), "key")?);
        self.record.put_slice(key);
        match value.as_payload() {
            Some(payload) => {
                self.record.put_i64(value.timestamp());
                self.record.put_i32(encode_len(payload.len(), "value")?);
                self.record.put_slice(payload);
            }
            None => self.record.put_i64(-value.timestamp()),
        }

        self.offsets.put_i64(self.current_offset as i64);
        self.writer.write_all(&self.record)?;

        self.current_offset += self.record.len() as u64;
        self.entry_count += 1;
        self.last_key = Some(key.to_vec());

        Ok(())
    }

    /// Number of records added so far
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Finish building: write offset index and footer, sync to disk
    ///
    /// Returns the final file size.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.write_all(&self.offsets)?;
        self.writer.write_all(&(self.entry_count as i32).to_be_bytes())?;
        self.writer.flush()?;

        let file = self.writer.into_inner().map_err(|e| {
            StrataError::Storage(format!("Failed to flush segment: {}", e))
        })?;
        file.sync_all()?;

        Ok(self.current_offset + self.entry_count as u64 * OFFSET_SIZE + FOOTER_SIZE)
    }
}

impl Segment {
    /// Serialize `rows` sorted cells into a new segment file at `path`
    ///
    /// The cells must be in ascending key order without duplicates.
    /// Returns the size of the written file.
    pub fn serialize<I>(path: &Path, cells: I, rows: usize) -> Result<u64>
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut builder = SegmentBuilder::new(path)?;
        for cell in cells {
            builder.add(&cell)?;
        }
        if builder.entry_count() as usize != rows {
            return Err(StrataError::Storage(format!(
                "expected {} rows for {}, got {}",
                rows,
                path.display(),
                builder.entry_count()
            )));
        }
        builder.finish()
    }
}

fn encode_len(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        StrataError::Storage(format!("{} of {} bytes is too large for a segment", what, len))
    })
}
