//! # Dataset - owned, timestamp-ordered stream datasets
//!
//! A [`StreamDataset`] owns a vector of [`Record`]s sorted by timestamp, the
//! [`Metadata`] synopsis of those records, and a map of free-form
//! annotations. Records and metadata are kept in lock-step by every
//! operation.
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                  |
//! |---------------|----------------------------------------------------------|
//! | [`lib.rs`]    | `StreamDataset`, constructors, accessors, annotations    |
//! | [`transform`] | `hash_streams`, `negate`, `time_shift`, `time_window`, `merge` |
//! | [`slice`]     | sub-range access, `time_index`, time windows by offset   |
//! | [`attr`]      | `AttrValue` annotation values                            |
//!
//! ## Chaining
//!
//! Transforms mutate the dataset in place and hand back `&mut Self`, so they
//! compose:
//!
//! ```rust
//! use dataset::StreamDataset;
//! use record::Record;
//!
//! let mut ds = StreamDataset::new(vec![
//!     Record::new(7, 0, 5, 1, 10),
//!     Record::new(9, 0, 5, 1, 30),
//! ]).unwrap();
//! ds.hash_streams(4).unwrap().time_shift(100).unwrap().negate();
//! assert_eq!(ds.metadata().ts_range(), (110, 130));
//! ```
//!
//! A dataset is never empty: there is no synopsis of nothing.

mod attr;
mod slice;
mod transform;

use std::collections::BTreeMap;
use std::fmt;

pub use attr::AttrValue;
pub use record::{analyze, DdsError, Metadata, Record, Result, RESERVED_ATTRS};
use record::{Key, SourceId, StreamId, Timestamp, Update};

/// A timestamp-sorted record vector with its synopsis and annotations.
///
/// `Clone` is a deep copy: the clone shares no mutable state with the
/// original.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDataset {
    records: Vec<Record>,
    meta: Metadata,
    annotations: BTreeMap<String, AttrValue>,
}

impl StreamDataset {
    /// Builds a dataset from records already sorted by timestamp.
    ///
    /// The metadata is computed with one linear scan.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if `records` is empty or not sorted.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let meta = analyze(&records)?;
        if !record::is_sorted(&records) {
            return Err(DdsError::Validation(
                "records are not sorted by timestamp".to_string(),
            ));
        }
        Ok(Self {
            records,
            meta,
            annotations: BTreeMap::new(),
        })
    }

    /// Builds a dataset from records in any order, sorting them stably by
    /// timestamp first.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if `records` is empty.
    pub fn from_unsorted(mut records: Vec<Record>) -> Result<Self> {
        records.sort_by_key(|r| r.timestamp);
        Self::new(records)
    }

    /// Builds a dataset from five parallel columns.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if the columns differ in length, and
    /// the errors of [`StreamDataset::new`] otherwise.
    pub fn from_columns(
        stream_ids: &[StreamId],
        source_ids: &[SourceId],
        keys: &[Key],
        updates: &[Update],
        timestamps: &[Timestamp],
    ) -> Result<Self> {
        let n = stream_ids.len();
        let lengths = [
            source_ids.len(),
            keys.len(),
            updates.len(),
            timestamps.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(DdsError::Argument(format!(
                "column lengths differ: stream_ids={} source_ids={} keys={} updates={} timestamps={}",
                n, lengths[0], lengths[1], lengths[2], lengths[3]
            )));
        }

        let records = (0..n)
            .map(|i| Record::new(stream_ids[i], source_ids[i], keys[i], updates[i], timestamps[i]))
            .collect();
        Self::new(records)
    }

    /// Reassembles a dataset from stored parts without rescanning the records.
    ///
    /// The metadata is trusted as given; only its length is checked.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if `records` is empty or unsorted, the
    /// metadata length disagrees with the record count, or an annotation uses
    /// a reserved name.
    pub fn from_parts(
        records: Vec<Record>,
        meta: Metadata,
        annotations: BTreeMap<String, AttrValue>,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(DdsError::Validation("dataset has no records".to_string()));
        }
        if meta.length != records.len() {
            return Err(DdsError::Validation(format!(
                "metadata length {} does not match {} records",
                meta.length,
                records.len()
            )));
        }
        if !record::is_sorted(&records) {
            return Err(DdsError::Validation(
                "records are not sorted by timestamp".to_string(),
            ));
        }
        for name in annotations.keys() {
            check_annotation_name(name)?;
        }
        Ok(Self {
            records,
            meta,
            annotations,
        })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; kept for the `len`/`is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// The records, in timestamp order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterates over the records in timestamp order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Consumes the dataset, returning its record vector.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    #[must_use]
    pub fn annotations(&self) -> &BTreeMap<String, AttrValue> {
        &self.annotations
    }

    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&AttrValue> {
        self.annotations.get(name)
    }

    /// Sets annotation `name`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if `name` is empty or one of
    /// [`RESERVED_ATTRS`].
    pub fn annotate(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<&mut Self> {
        check_annotation_name(name)?;
        self.annotations.insert(name.to_string(), value.into());
        Ok(self)
    }

    /// Removes annotation `name`, returning its value if it was set.
    pub fn remove_annotation(&mut self, name: &str) -> Option<AttrValue> {
        self.annotations.remove(name)
    }
}

/// Rejects annotation names that would shadow the persisted synopsis.
pub fn check_annotation_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DdsError::Validation("annotation name is empty".to_string()));
    }
    if RESERVED_ATTRS.contains(&name) {
        return Err(DdsError::Validation(format!(
            "annotation name '{}' is reserved",
            name
        )));
    }
    Ok(())
}

impl<'a> IntoIterator for &'a StreamDataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for StreamDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<StreamDataset of length {}>", self.meta.length)
    }
}

#[cfg(test)]
mod tests;
