//! Sub-range access and timestamp-offset indexing.
//!
//! All ranges are half-open. A slice copies its records into a new, independent
//! dataset; its synopsis inherits the parent's key range and id sets as-is and
//! only recomputes the time range and length, so it may be looser than what
//! [`analyze`](record::analyze) would report for the slice alone.

use std::ops::{Bound, Index, RangeBounds};

use record::{Result, Timestamp};

use crate::{DdsError, Record, StreamDataset};

impl StreamDataset {
    /// Returns the record at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Returns a new dataset holding the records in `range`.
    ///
    /// Annotations are copied from the parent.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if the range is empty, reversed, or
    /// extends past the end of the dataset.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<StreamDataset> {
        let len = self.records.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };

        if start >= end || end > len {
            return Err(DdsError::Argument(format!(
                "slice [{}, {}) is empty or out of bounds for length {}",
                start, end, len
            )));
        }

        let records = self.records[start..end].to_vec();
        let mut meta = self.meta.clone();
        meta.length = records.len();
        meta.ts_min = records[0].timestamp;
        meta.ts_max = records[records.len() - 1].timestamp;

        Ok(StreamDataset {
            records,
            meta,
            annotations: self.annotations.clone(),
        })
    }

    /// Resolves a time offset to a record index.
    ///
    /// For `dt >= 0` the target is `tstart() + dt`; for `dt < 0` it is
    /// `tend() + dt` (so `-1` targets the last timestamp). Returns the index of
    /// the first record whose timestamp is at least the target; every record
    /// before it is strictly earlier.
    #[must_use]
    pub fn time_index(&self, dt: Timestamp) -> usize {
        let target = if dt < 0 {
            self.tend() + i64::from(dt)
        } else {
            self.tstart() + i64::from(dt)
        };
        self.records
            .partition_point(|r| i64::from(r.timestamp) < target)
    }

    /// Cuts out the records between two time offsets, resolved with
    /// [`time_index`](Self::time_index).
    ///
    /// `ds.window(0, 3600)` is the first hour, `ds.window(-3600, -1)`
    /// the last hour except its final timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Argument`] if no record falls in the window.
    pub fn window(&self, from_dt: Timestamp, to_dt: Timestamp) -> Result<StreamDataset> {
        self.slice(self.time_index(from_dt)..self.time_index(to_dt))
    }

    /// Timestamp of the first record.
    #[must_use]
    pub fn tstart(&self) -> i64 {
        i64::from(self.records[0].timestamp)
    }

    /// Timestamp of the last record plus one.
    #[must_use]
    pub fn tend(&self) -> i64 {
        i64::from(self.records[self.records.len() - 1].timestamp) + 1
    }

    /// `tend() - tstart()`.
    #[must_use]
    pub fn tlen(&self) -> i64 {
        self.tend() - self.tstart()
    }
}

impl Index<usize> for StreamDataset {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}
