//! Dataset synopsis: length, timestamp/key ranges and id sets.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DdsError, Result};
use crate::{Key, Record, SourceId, StreamId, Timestamp};

/// Attribute names that carry the synopsis of a persisted dataset.
///
/// User annotations may not use these names.
pub const RESERVED_ATTRS: [&str; 4] = ["ts_range", "key_range", "stream_ids", "source_ids"];

/// Summary of a non-empty record collection.
///
/// For a collection `D` produced by [`analyze`]:
/// `ts_min`/`ts_max` and `key_min`/`key_max` are the extremes over `D`,
/// `stream_ids`/`source_ids` are the distinct ids in `D`, and
/// `length == D.len()`. There is no metadata for an empty collection.
///
/// Id sets are `BTreeSet`s, so they are always sorted and deduplicated and
/// `clone()` copies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub length: usize,
    pub ts_min: Timestamp,
    pub ts_max: Timestamp,
    pub key_min: Key,
    pub key_max: Key,
    pub stream_ids: BTreeSet<StreamId>,
    pub source_ids: BTreeSet<SourceId>,
}

/// Computes the metadata of `records` in a single linear scan.
///
/// # Errors
///
/// Returns [`DdsError::Validation`] if `records` is empty.
pub fn analyze(records: &[Record]) -> Result<Metadata> {
    let first = match records.first() {
        Some(r) => r,
        None => return Err(DdsError::validation("cannot analyze an empty record collection")),
    };

    let mut meta = Metadata {
        length: records.len(),
        ts_min: first.timestamp,
        ts_max: first.timestamp,
        key_min: first.key,
        key_max: first.key,
        stream_ids: BTreeSet::new(),
        source_ids: BTreeSet::new(),
    };

    for r in records {
        meta.ts_min = meta.ts_min.min(r.timestamp);
        meta.ts_max = meta.ts_max.max(r.timestamp);
        meta.key_min = meta.key_min.min(r.key);
        meta.key_max = meta.key_max.max(r.key);
        meta.stream_ids.insert(r.stream_id);
        meta.source_ids.insert(r.source_id);
    }

    Ok(meta)
}

/// Combines two synopses into the synopsis of the union of their collections.
///
/// Lengths add, ranges widen, id sets union. Neither input is modified.
pub fn merge_metadata(a: &Metadata, b: &Metadata) -> Metadata {
    let mut out = a.clone();
    out.merge(b);
    out
}

/// Validates a hash modulus for stream/source ids.
pub(crate) fn check_modulus(m: i16) -> Result<()> {
    if m <= 0 {
        return Err(DdsError::Argument(format!(
            "hash modulus must be positive, got {}",
            m
        )));
    }
    Ok(())
}

impl Metadata {
    /// Number of records summarized.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// `true` if no records are summarized, which [`analyze`] never produces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// `(ts_min, ts_max)`, both inclusive.
    #[must_use]
    pub fn ts_range(&self) -> (Timestamp, Timestamp) {
        (self.ts_min, self.ts_max)
    }

    /// `(key_min, key_max)`, both inclusive.
    #[must_use]
    pub fn key_range(&self) -> (Key, Key) {
        (self.key_min, self.key_max)
    }

    /// Folds `other` into `self`. See [`merge_metadata`].
    pub fn merge(&mut self, other: &Metadata) -> &mut Self {
        self.length += other.length;
        self.ts_min = self.ts_min.min(other.ts_min);
        self.ts_max = self.ts_max.max(other.ts_max);
        self.key_min = self.key_min.min(other.key_min);
        self.key_max = self.key_max.max(other.key_max);
        self.stream_ids.extend(other.stream_ids.iter().copied());
        self.source_ids.extend(other.source_ids.iter().copied());
        self
    }

    /// Replaces the stream-id set with its image under `f`.
    pub fn remap_stream_ids<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(StreamId) -> StreamId,
    {
        self.stream_ids = self.stream_ids.iter().map(|&id| f(id)).collect();
        self
    }

    /// Replaces the source-id set with its image under `f`.
    pub fn remap_source_ids<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(SourceId) -> SourceId,
    {
        self.source_ids = self.source_ids.iter().map(|&id| f(id)).collect();
        self
    }

    /// Maps every stream id to `id mod m`, with the result in `[0, m)`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if `m <= 0`.
    pub fn hash_streams(&mut self, m: StreamId) -> Result<&mut Self> {
        check_modulus(m)?;
        Ok(self.remap_stream_ids(|id| id.rem_euclid(m)))
    }

    /// Maps every source id to `id mod n`, with the result in `[0, n)`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if `n <= 0`.
    pub fn hash_sources(&mut self, n: SourceId) -> Result<&mut Self> {
        check_modulus(n)?;
        Ok(self.remap_source_ids(|id| id.rem_euclid(n)))
    }

    /// Shifts the timestamp range by `dt`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if either bound would overflow; `self`
    /// is left unchanged in that case.
    pub fn time_shift(&mut self, dt: Timestamp) -> Result<&mut Self> {
        let (lo, hi) = match (self.ts_min.checked_add(dt), self.ts_max.checked_add(dt)) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => {
                return Err(DdsError::Argument(format!(
                    "time shift by {} overflows range [{}, {}]",
                    dt, self.ts_min, self.ts_max
                )))
            }
        };
        self.ts_min = lo;
        self.ts_max = hi;
        Ok(self)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length={} ts_range=[{}, {}] key_range=[{}, {}] streams={:?} sources={:?}",
            self.length,
            self.ts_min,
            self.ts_max,
            self.key_min,
            self.key_max,
            self.stream_ids,
            self.source_ids
        )
    }
}
