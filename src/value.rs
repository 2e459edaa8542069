//! Versioned values and cells
//!
//! A [`Value`] is either a live payload or a tombstone, stamped with the
//! wall-clock time of the write. A [`Cell`] pairs a key with a value and is
//! the unit that flows through table iterators and the merge.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// A versioned payload: live bytes or a deletion marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Write time in milliseconds since the UNIX epoch, always > 0
    timestamp: i64,
    /// `None` marks a tombstone
    payload: Option<Vec<u8>>,
}

impl Value {
    /// Create a live value
    ///
    /// # Panics
    /// If `timestamp` is not positive.
    pub fn live(timestamp: i64, payload: Vec<u8>) -> Self {
        assert!(timestamp > 0, "value timestamp must be positive, got {}", timestamp);
        Self {
            timestamp,
            payload: Some(payload),
        }
    }

    /// Create a tombstone
    ///
    /// # Panics
    /// If `timestamp` is not positive.
    pub fn tombstone(timestamp: i64) -> Self {
        assert!(timestamp > 0, "tombstone timestamp must be positive, got {}", timestamp);
        Self {
            timestamp,
            payload: None,
        }
    }

    /// Live value stamped with the current wall-clock time
    pub fn live_now(payload: Vec<u8>) -> Self {
        Self::live(now_millis(), payload)
    }

    /// Tombstone stamped with the current wall-clock time
    pub fn tombstone_now() -> Self {
        Self::tombstone(now_millis())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_tombstone(&self) -> bool {
        self.payload.is_none()
    }

    /// Payload bytes of a live value
    ///
    /// # Panics
    /// If called on a tombstone; check [`Value::is_tombstone`] first.
    pub fn payload(&self) -> &[u8] {
        match &self.payload {
            Some(payload) => payload,
            None => panic!("requested payload of a tombstone"),
        }
    }

    /// Payload bytes, or `None` for a tombstone
    pub fn as_payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Length of the payload, zero for a tombstone
    pub(crate) fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }
}

/// Milliseconds since the UNIX epoch, clamped to at least 1.
///
/// Not monotonic: two writes within the same millisecond share a stamp.
/// Ordering between versions comes from source priority, never from here.
pub(crate) fn now_millis() -> i64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    millis.max(1)
}

/// Key order shared by every table: bytes compare as signed (`i8`), and a
/// proper prefix sorts before any longer key.
///
/// Segment files store records in this order, so it is part of the format.
pub fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    a.iter().map(|&x| x as i8).cmp(b.iter().map(|&x| x as i8))
}

/// Owned key ordered by [`compare_keys`], for sorted in-memory maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Key(pub(crate) Vec<u8>);

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&self.0, &other.0)
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A key paired with its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    key: Vec<u8>,
    value: Value,
}

impl Cell {
    pub fn new(key: Vec<u8>, value: Value) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Compare by key only; the value plays no part in merge ordering.
    pub fn cmp_key(&self, other: &Cell) -> Ordering {
        compare_keys(&self.key, &other.key)
    }

    pub fn into_parts(self) -> (Vec<u8>, Value) {
        (self.key, self.value)
    }
}
