//! Mutating transforms: id hashing, negation, time shifting, merging and
//! time windowing.
//!
//! Each transform updates records and metadata together and returns the
//! dataset for chaining. A transform that fails leaves the dataset untouched.

use merge::{merge_pair, merge_records};
use record::{Result, SourceId, StreamId, Timestamp};
use tracing::debug;

use crate::{DdsError, Record, StreamDataset};

impl StreamDataset {
    /// Replaces every `stream_id` with `stream_id mod m` (in `[0, m)`).
    ///
    /// The metadata stream-id set becomes the deduplicated image of the old
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if `m <= 0`.
    pub fn hash_streams(&mut self, m: StreamId) -> Result<&mut Self> {
        self.meta.hash_streams(m)?;
        for r in &mut self.records {
            r.stream_id = r.stream_id.rem_euclid(m);
        }
        Ok(self)
    }

    /// Replaces every `source_id` with `source_id mod n` (in `[0, n)`).
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if `n <= 0`.
    pub fn hash_sources(&mut self, n: SourceId) -> Result<&mut Self> {
        self.meta.hash_sources(n)?;
        for r in &mut self.records {
            r.source_id = r.source_id.rem_euclid(n);
        }
        Ok(self)
    }

    /// Flips the sign of every update count. Metadata is unaffected.
    ///
    /// `i32::MIN` wraps to itself.
    pub fn negate(&mut self) -> &mut Self {
        for r in &mut self.records {
            r.update = r.update.wrapping_neg();
        }
        self
    }

    /// Adds `dt` to every timestamp and to the metadata time range.
    ///
    /// Order is preserved, so the dataset stays sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if any shifted timestamp would overflow.
    pub fn time_shift(&mut self, dt: Timestamp) -> Result<&mut Self> {
        let first = self.records[0].timestamp;
        let last = self.records[self.records.len() - 1].timestamp;
        if first.checked_add(dt).is_none() || last.checked_add(dt).is_none() {
            return Err(DdsError::Argument(format!(
                "time shift by {} overflows timestamps [{}, {}]",
                dt, first, last
            )));
        }
        self.meta.time_shift(dt)?;
        for r in &mut self.records {
            r.timestamp += dt;
        }
        Ok(self)
    }

    /// Merges the records of `other` into this dataset, keeping timestamp
    /// order. Annotations of `other` are ignored.
    pub fn merge(&mut self, other: &StreamDataset) -> &mut Self {
        self.records = merge_pair(&self.records, &other.records);
        self.meta.merge(&other.meta);
        debug!(length = self.records.len(), "merged dataset");
        self
    }

    /// Merges several datasets into this one in a single multi-way pass.
    ///
    /// Ties between equal timestamps keep `self` first, then `others` in
    /// order.
    pub fn merge_many(&mut self, others: &[&StreamDataset]) -> &mut Self {
        let mut inputs: Vec<&[Record]> = Vec::with_capacity(others.len() + 1);
        inputs.push(&self.records);
        inputs.extend(others.iter().map(|d| d.records()));
        let merged = merge_records(&inputs);

        for other in others {
            self.meta.merge(&other.meta);
        }
        self.records = merged;
        debug!(
            inputs = others.len() + 1,
            length = self.records.len(),
            "merged datasets"
        );
        self
    }

    /// Applies a sliding time window of width `tw`.
    ///
    /// Every record is paired with a negated copy `tw` time units later, so
    /// each event's contribution expires after `tw`. The length doubles and
    /// the metadata becomes the merge of the original and shifted synopses.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if shifting by `tw` overflows.
    pub fn time_window(&mut self, tw: Timestamp) -> Result<&mut Self> {
        let mut expiries = self.clone();
        expiries.time_shift(tw)?.negate();
        Ok(self.merge(&expiries))
    }
}
