//! # Record - stream tuple and synopsis types
//!
//! The leaf data unit of every stream dataset is a [`Record`]: a fixed
//! five-field tuple describing one update to one key of one logical stream,
//! observed at one source at one point in time.
//!
//! A collection of records is summarized by a [`Metadata`] synopsis (length,
//! timestamp range, key range, stream-id set, source-id set). Synopses are
//! computed with [`analyze`] and combined with [`merge_metadata`] without
//! touching the records themselves.
//!
//! ## Example
//!
//! ```rust
//! use record::{analyze, Record};
//!
//! let data = vec![Record::new(1, 0, 5, 1, 10), Record::new(2, 0, 9, 1, 20)];
//! let meta = analyze(&data).unwrap();
//! assert_eq!(meta.ts_range(), (10, 20));
//! assert_eq!(meta.len(), 2);
//! ```

mod error;
mod metadata;

use std::fmt;

pub use error::{DdsError, Result};
pub use metadata::{analyze, merge_metadata, Metadata, RESERVED_ATTRS};

/// Logical partition of the event universe.
pub type StreamId = i16;
/// Origin (host) identifier of a record.
pub type SourceId = i16;
/// Record key.
pub type Key = i32;
/// Signed update count applied to a key at a timestamp.
pub type Update = i32;
/// Record timestamp.
pub type Timestamp = i32;

/// One event tuple `(stream_id, source_id, key, update, timestamp)`.
///
/// Records are plain values. A collection of records is a contiguous slice,
/// ordered by `timestamp` wherever a dataset owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Record {
    pub stream_id: StreamId,
    pub source_id: SourceId,
    pub key: Key,
    pub update: Update,
    pub timestamp: Timestamp,
}

impl Record {
    /// Size of one encoded record in bytes (`2 + 2 + 4 + 4 + 4`).
    pub const ENCODED_LEN: usize = 16;

    pub const fn new(
        stream_id: StreamId,
        source_id: SourceId,
        key: Key,
        update: Update,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            stream_id,
            source_id,
            key,
            update,
            timestamp,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{},{}[{}],ts={} at {}>",
            self.stream_id,
            if self.update >= 0 { "INS" } else { "DEL" },
            self.key,
            self.timestamp,
            self.source_id
        )
    }
}

/// Returns `true` if `records` is non-decreasing by timestamp.
///
/// Empty and single-record slices are sorted.
pub fn is_sorted(records: &[Record]) -> bool {
    records
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp)
}

#[cfg(test)]
mod tests;
