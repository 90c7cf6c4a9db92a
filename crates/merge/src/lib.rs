//! # Merge - multi-way merge of timestamp-sorted record arrays
//!
//! Produces the multiset union of N record arrays, each sorted by timestamp,
//! as one array sorted by timestamp. This is the primitive behind dataset
//! merging and time windowing.
//!
//! ## Algorithm
//!
//! Instead of concatenating and sorting (`O(n log n)` no matter how the inputs
//! overlap) the merge bisects the **timestamp range**:
//!
//! ```text
//! split([T0, T1), slices):
//!   at most one slice non-empty  -> copy it to the output, done
//!   T1 - T0 == 1                 -> append all slices in input order, done
//!   otherwise                    -> Tm = (T0 + T1) / 2
//!                                   cut every slice at lower_bound(Tm)
//!                                   split([T0, Tm), left halves)
//!                                   split([Tm, T1), right halves)
//! ```
//!
//! Inputs recorded over disjoint or mildly overlapping time windows hit the
//! single-slice case almost immediately, so the real cost is close to `O(n)`.
//! Recursion depth is bounded by the bit width of the timestamp range, not by
//! the number of records.
//!
//! ## Ties
//!
//! Records sharing a timestamp come out grouped by input, in input order, and
//! each input's own order is kept. The merge is therefore stable by input
//! index and deterministic for identical inputs.

use record::Record;
use tracing::debug;

/// Counters describing which cases a merge run went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Ranges resolved by copying a single non-empty slice.
    pub fast_copies: usize,
    /// Width-1 ranges resolved by concatenating several slices.
    pub tie_runs: usize,
    /// Ranges bisected at their midpoint.
    pub splits: usize,
}

/// Merges the given timestamp-sorted inputs into one sorted vector.
///
/// Empty inputs are ignored; with no non-empty input the result is empty.
///
/// # Panics
///
/// Panics if the number of records written differs from the total input
/// length.
pub fn merge_records(inputs: &[&[Record]]) -> Vec<Record> {
    merge_records_with_stats(inputs).0
}

/// Convenience wrapper for the two-input case.
pub fn merge_pair(a: &[Record], b: &[Record]) -> Vec<Record> {
    merge_records(&[a, b])
}

/// Like [`merge_records`], also returning the [`MergeStats`] of the run.
pub fn merge_records_with_stats(inputs: &[&[Record]]) -> (Vec<Record>, MergeStats) {
    let inputs: Vec<&[Record]> = inputs.iter().copied().filter(|d| !d.is_empty()).collect();
    if inputs.is_empty() {
        return (Vec::new(), MergeStats::default());
    }
    debug_assert!(
        inputs.iter().all(|d| record::is_sorted(d)),
        "merge inputs must be sorted by timestamp"
    );

    let total: usize = inputs.iter().map(|d| d.len()).sum();

    // Global range [t0, t1). Widened to i64 so that ts == i32::MAX still has
    // an exclusive upper bound.
    let t0 = inputs
        .iter()
        .map(|d| i64::from(d[0].timestamp))
        .min()
        .unwrap_or_default();
    let t1 = inputs
        .iter()
        .map(|d| i64::from(d[d.len() - 1].timestamp))
        .max()
        .unwrap_or_default()
        + 1;

    let lo = vec![0usize; inputs.len()];
    let hi: Vec<usize> = inputs.iter().map(|d| d.len()).collect();

    let mut merger = Merger {
        inputs: &inputs,
        out: Vec::with_capacity(total),
        stats: MergeStats::default(),
    };
    merger.split(t0, t1, &lo, &hi);

    assert_eq!(
        merger.out.len(),
        total,
        "merge wrote {} records but the inputs hold {}",
        merger.out.len(),
        total
    );

    debug!(
        inputs = inputs.len(),
        records = total,
        fast_copies = merger.stats.fast_copies,
        tie_runs = merger.stats.tie_runs,
        splits = merger.stats.splits,
        "merged record arrays"
    );

    (merger.out, merger.stats)
}

/// Recursion state. `out.len()` is the write cursor.
struct Merger<'a> {
    inputs: &'a [&'a [Record]],
    out: Vec<Record>,
    stats: MergeStats,
}

impl Merger<'_> {
    /// Invariant: for every input `d`, `inputs[d][lo[d]..hi[d]]` holds exactly
    /// the records of `d` with timestamps in `[t0, t1)`.
    fn split(&mut self, t0: i64, t1: i64, lo: &[usize], hi: &[usize]) {
        let mut non_empty = (0..self.inputs.len()).filter(|&d| lo[d] < hi[d]);
        let first = match non_empty.next() {
            Some(d) => d,
            None => return,
        };

        if non_empty.next().is_none() {
            // Only one input has records here: one bulk copy, no recursion.
            self.out
                .extend_from_slice(&self.inputs[first][lo[first]..hi[first]]);
            self.stats.fast_copies += 1;
            return;
        }

        if t1 - t0 <= 1 {
            // A single timestamp: nothing left to order.
            for (d, input) in self.inputs.iter().enumerate() {
                self.out.extend_from_slice(&input[lo[d]..hi[d]]);
            }
            self.stats.tie_runs += 1;
            return;
        }

        let tm = (t0 + t1).div_euclid(2);
        let mid: Vec<usize> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(d, input)| {
                lo[d] + input[lo[d]..hi[d]].partition_point(|r| i64::from(r.timestamp) < tm)
            })
            .collect();
        self.stats.splits += 1;

        self.split(t0, tm, lo, &mid);
        self.split(tm, t1, &mid, hi);
    }
}
