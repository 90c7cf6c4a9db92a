use super::helpers::{dataset_at, rec, timestamps};
use crate::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

// -------------------- Hashing --------------------

#[test]
fn hash_streams_maps_ids_into_range() {
    let mut ds = StreamDataset::new(vec![
        rec(-7, 0, 0, 1, 1),
        rec(5, 0, 0, 1, 2),
        rec(12, 0, 0, 1, 3),
        rec(3, 0, 0, 1, 4),
    ])
    .unwrap();
    let original: BTreeSet<i16> = ds.metadata().stream_ids.clone();

    ds.hash_streams(4).unwrap();

    assert!(ds.iter().all(|r| (0..4).contains(&r.stream_id)));
    let image: BTreeSet<i16> = original.iter().map(|id| id.rem_euclid(4)).collect();
    assert_eq!(ds.metadata().stream_ids, image);
    assert_eq!(ds.metadata().stream_ids, analyze(ds.records()).unwrap().stream_ids);
}

#[test]
fn hash_sources_updates_records_and_metadata() {
    let mut ds = StreamDataset::new(vec![rec(0, 10, 0, 1, 1), rec(0, 21, 0, 1, 2)]).unwrap();
    ds.hash_sources(10).unwrap();
    let hids: Vec<i16> = ds.iter().map(|r| r.source_id).collect();
    assert_eq!(hids, vec![0, 1]);
    assert_eq!(ds.metadata().source_ids, BTreeSet::from([0, 1]));
}

#[test]
fn hash_with_zero_modulus_is_argument_failure() {
    let mut ds = dataset_at(&[1, 2], 2);
    let before = ds.clone();
    assert!(ds.hash_streams(0).unwrap_err().is_argument());
    assert!(ds.hash_sources(-1).unwrap_err().is_argument());
    assert_eq!(ds, before);
}

// -------------------- Negate / shift --------------------

#[test]
fn negate_flips_updates_only() {
    let mut ds = StreamDataset::new(vec![rec(0, 0, 1, 3, 1), rec(0, 0, 2, -2, 2)]).unwrap();
    let meta = ds.metadata().clone();
    ds.negate();
    let upds: Vec<i32> = ds.iter().map(|r| r.update).collect();
    assert_eq!(upds, vec![-3, 2]);
    assert_eq!(ds.metadata(), &meta);
}

#[test]
fn time_shift_moves_records_and_range() {
    let mut ds = dataset_at(&[10, 10, 15], 1);
    ds.time_shift(-20).unwrap();
    assert_eq!(timestamps(&ds), vec![-10, -10, -5]);
    assert_eq!(ds.metadata().ts_range(), (-10, -5));
    assert_eq!(ds.metadata(), &analyze(ds.records()).unwrap());
}

#[test]
fn time_shift_overflow_leaves_dataset_unchanged() {
    let mut ds = dataset_at(&[0, i32::MAX - 3], 1);
    let before = ds.clone();
    assert!(ds.time_shift(10).unwrap_err().is_argument());
    assert_eq!(ds, before);
}

#[test]
fn transforms_chain() {
    let mut ds = dataset_at(&[1, 2, 3], 3);
    ds.hash_streams(2)
        .unwrap()
        .hash_sources(1)
        .unwrap()
        .time_shift(5)
        .unwrap()
        .negate();
    assert_eq!(timestamps(&ds), vec![6, 7, 8]);
    assert!(ds.iter().all(|r| r.update == -1 && r.source_id == 0));
}

// -------------------- Merge --------------------

#[test]
fn merge_scenario() {
    let mut a = StreamDataset::new(vec![rec(1, 0, 5, 1, 10), rec(1, 0, 5, 1, 30)]).unwrap();
    let b = StreamDataset::new(vec![rec(2, 0, 9, 1, 20)]).unwrap();

    a.merge(&b);

    assert_eq!(timestamps(&a), vec![10, 20, 30]);
    assert_eq!(a.len(), 3);
    assert_eq!(a.metadata().length, 3);
    assert_eq!(a.metadata().ts_range(), (10, 30));
    assert_eq!(a.metadata(), &analyze(a.records()).unwrap());
}

#[test]
fn merge_keeps_own_annotations() {
    let mut a = dataset_at(&[1], 1);
    a.annotate("origin", "a").unwrap();
    let mut b = dataset_at(&[2], 1);
    b.annotate("origin", "b").unwrap();
    b.annotate("extra", 1).unwrap();

    a.merge(&b);
    assert_eq!(a.annotation("origin"), Some(&AttrValue::from("a")));
    assert!(a.annotation("extra").is_none());
}

#[test]
fn merge_many_combines_all_inputs() {
    let mut a = dataset_at(&[1, 5, 9], 1);
    let b = dataset_at(&[2, 5, 8], 2);
    let c = dataset_at(&[0, 10], 3);

    a.merge_many(&[&b, &c]);

    assert_eq!(timestamps(&a), vec![0, 1, 2, 5, 5, 8, 9, 10]);
    assert_eq!(a.metadata(), &analyze(a.records()).unwrap());
}

// -------------------- Time window --------------------

#[test]
fn time_window_doubles_length() {
    let mut ds = dataset_at(&[0, 3, 3, 7], 2);
    ds.time_window(5).unwrap();
    assert_eq!(ds.len(), 8);
    assert_eq!(ds.metadata().length, 8);
    assert_eq!(timestamps(&ds), vec![0, 3, 3, 5, 7, 8, 8, 12]);
    assert_eq!(ds.metadata().ts_range(), (0, 12));
}

#[test]
fn time_window_twin_appears_once_tw_later() {
    let mut ds = StreamDataset::new(vec![rec(4, 2, 77, 3, 100), rec(1, 1, 5, 1, 150)]).unwrap();
    ds.time_window(60).unwrap();

    let twins: Vec<&Record> = ds
        .iter()
        .filter(|r| r.key == 77 && r.update == -3)
        .collect();
    assert_eq!(twins.len(), 1);
    assert_eq!(*twins[0], rec(4, 2, 77, -3, 160));
}

#[test]
fn time_window_cancels_updates_after_expiry() {
    let mut ds = dataset_at(&[0, 1, 2, 3, 4], 1);
    ds.time_window(2).unwrap();

    // Net contribution of everything at or before t: inserts minus expiries.
    let net_until = |t: i32| -> i32 {
        ds.iter()
            .filter(|r| r.timestamp <= t)
            .map(|r| r.update)
            .sum()
    };
    assert_eq!(net_until(1), 2);
    assert_eq!(net_until(4), 2);
    assert_eq!(net_until(6), 0);
}

#[test]
fn time_window_overflow_is_rejected() {
    let mut ds = dataset_at(&[i32::MAX - 1], 1);
    let before = ds.clone();
    assert!(ds.time_window(5).unwrap_err().is_argument());
    assert_eq!(ds, before);
}

// -------------------- Properties --------------------

fn arb_dataset() -> impl Strategy<Value = StreamDataset> {
    proptest::collection::vec((-20i16..20, -5i16..5, -100i32..100, -1000i32..1000), 1..80)
        .prop_map(|v| {
            let records = v
                .into_iter()
                .map(|(s, h, k, t)| Record::new(s, h, k, 1, t))
                .collect();
            StreamDataset::from_unsorted(records).unwrap()
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn merge_metadata_matches_rescan(a in arb_dataset(), b in arb_dataset()) {
        let mut merged = a.clone();
        merged.merge(&b);
        prop_assert_eq!(merged.len(), a.len() + b.len());
        prop_assert!(record::is_sorted(merged.records()));
        prop_assert_eq!(merged.metadata(), &analyze(merged.records()).unwrap());
    }

    #[test]
    fn time_window_preserves_sort_and_doubles(ds in arb_dataset(), tw in 1i32..500) {
        let mut windowed = ds.clone();
        windowed.time_window(tw).unwrap();
        prop_assert_eq!(windowed.len(), 2 * ds.len());
        prop_assert!(record::is_sorted(windowed.records()));
        let total: i64 = windowed.iter().map(|r| i64::from(r.update)).sum();
        prop_assert_eq!(total, 0);
    }

    #[test]
    fn hash_streams_bounds_every_record(mut ds in arb_dataset(), m in 1i16..8) {
        ds.hash_streams(m).unwrap();
        prop_assert!(ds.iter().all(|r| 0 <= r.stream_id && r.stream_id < m));
        prop_assert_eq!(&ds.metadata().stream_ids, &analyze(ds.records()).unwrap().stream_ids);
    }
}
