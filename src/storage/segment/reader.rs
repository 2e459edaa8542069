//! Segment Reader
//!
//! Opens segment files and positions reads with an O(log n) binary search
//! over the on-disk offset index. Nothing but the footer is read at open.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Buf;

use crate::error::Result;
use crate::table::{CellIter, Table};
use crate::value::{compare_keys, Cell, Value};
use crate::StrataError;

use super::iterator::SegmentIterator;
use super::{FOOTER_SIZE, LEN_SIZE, OFFSET_SIZE, TIMESTAMP_SIZE};

/// Immutable, file-backed sorted table
///
/// Holds one read handle for its whole lifetime; the handle is released on
/// `close()` or when the segment is dropped.
#[derive(Debug)]
pub struct Segment {
    /// Backing file path
    path: PathBuf,
    /// Read handle; `None` once closed
    file: Option<File>,
    /// Total file size in bytes
    file_size: u64,
    /// Row count decoded from the footer
    rows: u32,
}

impl Segment {
    /// Open a segment for reading
    ///
    /// Reads only the footer; fails if the file is too small to hold the
    /// offset index it declares.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < FOOTER_SIZE {
            return Err(StrataError::Corruption(format!(
                "{} is {} bytes, too small for a footer",
                path.display(),
                file_size
            )));
        }

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;
        let rows = (&footer[..]).get_i32();

        if rows < 0 {
            return Err(StrataError::Corruption(format!(
                "{} declares negative row count {}",
                path.display(),
                rows
            )));
        }
        let rows = rows as u32;
        if FOOTER_SIZE + rows as u64 * OFFSET_SIZE > file_size {
            return Err(StrataError::Corruption(format!(
                "{} declares {} rows but is only {} bytes",
                path.display(),
                rows,
                file_size
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            file_size,
            rows,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows in this segment
    pub fn row_count(&self) -> u32 {
        self.rows
    }

    /// Size of the backing file in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Iterate cells with key >= `from`
    ///
    /// Positioning is a lower-bound binary search; each advance decodes one
    /// record.
    pub fn iter_from(&self, from: &[u8]) -> Result<SegmentIterator<'_>> {
        let row = self.lower_bound(from)?;
        let offset = if row < self.rows {
            self.offset_at(row)?
        } else {
            self.index_start()
        };
        Ok(SegmentIterator::new(self, row, offset))
    }

    /// Smallest row whose key is >= `from`, or `rows` if there is none
    pub(crate) fn lower_bound(&self, from: &[u8]) -> Result<u32> {
        let mut left: i64 = 0;
        let mut right: i64 = self.rows as i64 - 1;
        while left <= right {
            let mid = (left + right) / 2;
            match compare_keys(from, &self.key_at(mid as u32)?) {
                Ordering::Less => right = mid - 1,
                Ordering::Greater => left = mid + 1,
                Ordering::Equal => return Ok(mid as u32),
            }
        }
        Ok(left as u32)
    }

    /// First byte of the offset index (one past the last record)
    pub(crate) fn index_start(&self) -> u64 {
        self.file_size - FOOTER_SIZE - self.rows as u64 * OFFSET_SIZE
    }

    /// Absolute offset of the record at `row`, read from the index
    pub(crate) fn offset_at(&self, row: u32) -> Result<u64> {
        debug_assert!(row < self.rows);
        let position = self.index_start() + row as u64 * OFFSET_SIZE;
        let offset = self.with_file(position, |file| {
            let mut buf = [0u8; OFFSET_SIZE as usize];
            file.read_exact(&mut buf)?;
            Ok((&buf[..]).get_i64())
        })?;

        if offset < 0 || offset as u64 >= self.index_start() {
            return Err(self.corruption(format!("row {} has bad offset {}", row, offset)));
        }
        Ok(offset as u64)
    }

    /// Key of the record at `row`
    pub(crate) fn key_at(&self, row: u32) -> Result<Vec<u8>> {
        let offset = self.offset_at(row)?;
        let limit = self.index_start();
        self.with_file(offset, |file| self.read_key(file, offset, limit))
    }

    /// Decode the record starting at `offset`
    ///
    /// Returns the cell and the offset of the following record.
    pub(crate) fn record_at(&self, offset: u64) -> Result<(Cell, u64)> {
        let limit = self.index_start();
        self.with_file(offset, |file| {
            let key = self.read_key(file, offset, limit)?;
            let mut position = offset + LEN_SIZE + key.len() as u64;

            self.check_span(position, TIMESTAMP_SIZE, limit)?;
            let mut buf = [0u8; TIMESTAMP_SIZE as usize];
            file.read_exact(&mut buf)?;
            let stamp = (&buf[..]).get_i64();
            position += TIMESTAMP_SIZE;

            let value = match stamp {
                0 | i64::MIN => {
                    return Err(self.corruption(format!("bad timestamp {} at {}", stamp, offset)));
                }
                s if s > 0 => {
                    let len = self.read_len(file, position, limit)?;
                    position += LEN_SIZE;
                    self.check_span(position, len, limit)?;
                    let mut payload = vec![0u8; len as usize];
                    file.read_exact(&mut payload)?;
                    position += len;
                    Value::live(s, payload)
                }
                s => Value::tombstone(-s),
            };

            Ok((Cell::new(key, value), position))
        })
    }

    fn read_key(&self, file: &mut impl Read, offset: u64, limit: u64) -> Result<Vec<u8>> {
        let len = self.read_len(file, offset, limit)?;
        self.check_span(offset + LEN_SIZE, len, limit)?;
        let mut key = vec![0u8; len as usize];
        file.read_exact(&mut key)?;
        Ok(key)
    }

    /// Read an i32 length prefix at the current file position
    fn read_len(&self, file: &mut impl Read, position: u64, limit: u64) -> Result<u64> {
        self.check_span(position, LEN_SIZE, limit)?;
        let mut buf = [0u8; LEN_SIZE as usize];
        file.read_exact(&mut buf)?;
        let len = (&buf[..]).get_i32();
        if len < 0 {
            return Err(self.corruption(format!("negative length {} at {}", len, position)));
        }
        Ok(len as u64)
    }

    fn check_span(&self, position: u64, len: u64, limit: u64) -> Result<()> {
        if position + len > limit {
            return Err(self.corruption(format!(
                "{} bytes at {} run past the record area",
                len, position
            )));
        }
        Ok(())
    }

    /// Run `f` with the file positioned at `position`
    ///
    /// Reads go through `&File`, so a shared borrow of the segment is enough.
    fn with_file<T>(&self, position: u64, f: impl FnOnce(&mut &File) -> Result<T>) -> Result<T> {
        let mut file = self.file.as_ref().ok_or_else(|| {
            StrataError::Storage(format!("segment {} is closed", self.path.display()))
        })?;
        file.seek(SeekFrom::Start(position))?;
        f(&mut file)
    }

    fn corruption(&self, detail: String) -> StrataError {
        StrataError::Corruption(format!("{}: {}", self.path.display(), detail))
    }
}

impl Table for Segment {
    fn iter_from<'a>(&'a self, from: &[u8]) -> Result<CellIter<'a>> {
        Ok(Box::new(Segment::iter_from(self, from)?))
    }

    fn upsert(&mut self, _key: &[u8], _value: &[u8]) -> Result<()> {
        Err(StrataError::Unsupported("segments are immutable"))
    }

    fn remove(&mut self, _key: &[u8]) -> Result<()> {
        Err(StrataError::Unsupported("segments are immutable"))
    }

    fn size_in_bytes(&self) -> u64 {
        self.file_size
    }

    fn row_count(&self) -> usize {
        self.rows as usize
    }

    fn close(&mut self) -> Result<()> {
        self.file.take();
        Ok(())
    }
}
