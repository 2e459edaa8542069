//! Tests for StorageManager
//!
//! These tests verify:
//! - Segment discovery on startup
//! - Tolerance of unusable files in the directory
//! - The flush protocol (temp file, rename, registration)
//! - Generation numbering
//! - Newest-first source ordering

use std::fs;

use strata::memtable::MemTable;
use strata::storage::{Segment, StorageManager};
use strata::{Cell, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn memtable_with(entries: &[(&str, &str)]) -> MemTable {
    let mut memtable = MemTable::new();
    for (key, value) in entries {
        memtable.put(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }
    memtable
}

fn write_raw_segment(dir: &std::path::Path, name: &str, entries: &[(&str, &str)]) {
    let cells: Vec<Cell> = entries
        .iter()
        .map(|(k, v)| Cell::new(k.as_bytes().to_vec(), Value::live(1, v.as_bytes().to_vec())))
        .collect();
    let rows = cells.len();
    Segment::serialize(&dir.join(name), cells, rows).unwrap();
}

fn dir_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("segments");

    let manager = StorageManager::open(&dir).unwrap();

    assert!(dir.exists());
    assert_eq!(manager.segment_count(), 0);
    assert_eq!(manager.generation(), 0);
}

#[test]
fn test_open_loads_existing_segments() {
    let temp = TempDir::new().unwrap();
    write_raw_segment(temp.path(), "0.dat", &[("a", "1")]);
    write_raw_segment(temp.path(), "4.dat", &[("b", "2")]);

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.segment_count(), 2);
    let generations: Vec<u64> = manager.segments().map(|(g, _)| g).collect();
    assert_eq!(generations, vec![0, 4]);
}

#[test]
fn test_generation_resumes_at_highest_seen() {
    let temp = TempDir::new().unwrap();
    write_raw_segment(temp.path(), "2.dat", &[("a", "1")]);
    write_raw_segment(temp.path(), "11.dat", &[("b", "2")]);

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.generation(), 11);
}

#[test]
fn test_ignores_unrelated_files() {
    let temp = TempDir::new().unwrap();
    write_raw_segment(temp.path(), "0.dat", &[("a", "1")]);
    fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
    fs::write(temp.path().join("7.tmp"), b"partial").unwrap();
    fs::create_dir(temp.path().join("9.dat")).unwrap();

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.segment_count(), 1);
    assert_eq!(manager.generation(), 0);
}

#[test]
fn test_skips_unparseable_and_corrupt_segments() {
    let temp = TempDir::new().unwrap();
    write_raw_segment(temp.path(), "0.dat", &[("a", "1")]);
    fs::write(temp.path().join("garbage.dat"), b"whatever").unwrap();
    fs::write(temp.path().join("1.dat"), [0xffu8]).unwrap();

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.segment_count(), 1);
    let generations: Vec<u64> = manager.segments().map(|(g, _)| g).collect();
    assert_eq!(generations, vec![0]);
    // the corrupt file's name still counts toward the generation counter
    assert_eq!(manager.generation(), 1);
}

#[cfg(unix)]
#[test]
fn test_skips_entries_that_are_not_segment_files() {
    let temp = TempDir::new().unwrap();
    write_raw_segment(temp.path(), "0.dat", &[("a", "1")]);
    fs::create_dir(temp.path().join("2.dat")).unwrap();
    std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("3.dat")).unwrap();

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.segment_count(), 1);
    assert_eq!(manager.generation(), 0);
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_writes_generation_file() {
    let temp = TempDir::new().unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();

    let generation = manager.flush(&memtable_with(&[("a", "1"), ("b", "2")])).unwrap();

    assert_eq!(generation, 0);
    assert_eq!(manager.generation(), 1);
    assert_eq!(manager.segment_count(), 1);
    assert_eq!(dir_names(temp.path()), vec!["0.dat"]);
}

#[test]
fn test_flush_multiple_memtables() {
    let temp = TempDir::new().unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();

    for i in 0..3 {
        let key = format!("key{}", i);
        manager.flush(&memtable_with(&[(key.as_str(), "v")])).unwrap();
    }

    assert_eq!(manager.segment_count(), 3);
    assert_eq!(dir_names(temp.path()), vec!["0.dat", "1.dat", "2.dat"]);
}

#[test]
fn test_flush_with_tombstones() {
    let temp = TempDir::new().unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();

    let mut memtable = memtable_with(&[("a", "1")]);
    memtable.delete(b"b".to_vec());
    manager.flush(&memtable).unwrap();

    let (_, segment) = manager.segments().next().unwrap();
    assert_eq!(segment.row_count(), 2);
    let cells: Vec<Cell> = segment
        .iter_from(b"")
        .unwrap()
        .collect::<strata::Result<_>>()
        .unwrap();
    assert!(cells[1].value().is_tombstone());
}

#[test]
fn test_flush_overwrites_stale_temp_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("0.tmp"), b"left over from a crash").unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();

    manager.flush(&memtable_with(&[("a", "1")])).unwrap();

    assert_eq!(dir_names(temp.path()), vec!["0.dat"]);
}

#[test]
fn test_first_flush_after_reopen_reuses_highest_generation() {
    let temp = TempDir::new().unwrap();
    {
        let mut manager = StorageManager::open(temp.path()).unwrap();
        manager.flush(&memtable_with(&[("a", "1")])).unwrap();
        manager.flush(&memtable_with(&[("b", "2")])).unwrap();
        manager.close().unwrap();
    }

    let mut manager = StorageManager::open(temp.path()).unwrap();
    assert_eq!(manager.generation(), 1);

    let generation = manager.flush(&memtable_with(&[("c", "3")])).unwrap();

    assert_eq!(generation, 1);
    assert_eq!(manager.generation(), 2);
    assert_eq!(manager.segment_count(), 2);
    assert_eq!(dir_names(temp.path()), vec!["0.dat", "1.dat"]);
}

// =============================================================================
// Read Source Tests
// =============================================================================

#[test]
fn test_iter_sources_newest_first() {
    let temp = TempDir::new().unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();
    manager.flush(&memtable_with(&[("k", "old")])).unwrap();
    manager.flush(&memtable_with(&[("k", "new")])).unwrap();

    let values: Vec<Vec<u8>> = manager
        .iter_sources(b"k")
        .unwrap()
        .into_iter()
        .map(|mut source| source.next().unwrap().unwrap().value().payload().to_vec())
        .collect();

    assert_eq!(values, vec![b"new".to_vec(), b"old".to_vec()]);
}

#[test]
fn test_close_releases_segments() {
    let temp = TempDir::new().unwrap();
    let mut manager = StorageManager::open(temp.path()).unwrap();
    manager.flush(&memtable_with(&[("a", "1")])).unwrap();

    manager.close().unwrap();

    assert!(manager.iter_sources(b"").is_err());
}
