use super::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn rec(sid: i16, hid: i16, key: i32, ts: i32) -> Record {
    Record::new(sid, hid, key, 1, ts)
}

// -------------------- analyze --------------------

#[test]
fn analyze_empty_is_validation_failure() {
    let err = analyze(&[]).unwrap_err();
    assert!(err.is_validation(), "unexpected error: {}", err);
}

#[test]
fn analyze_single_record() {
    let meta = analyze(&[rec(3, 7, -4, 42)]).unwrap();
    assert_eq!(meta.len(), 1);
    assert_eq!(meta.ts_range(), (42, 42));
    assert_eq!(meta.key_range(), (-4, -4));
    assert_eq!(meta.stream_ids, BTreeSet::from([3]));
    assert_eq!(meta.source_ids, BTreeSet::from([7]));
}

#[test]
fn analyze_collects_ranges_and_sets() {
    let data = vec![rec(1, 0, 5, 10), rec(2, 3, 9, 20), rec(1, 3, -2, 30)];
    let meta = analyze(&data).unwrap();
    assert_eq!(meta.length, 3);
    assert_eq!(meta.ts_range(), (10, 30));
    assert_eq!(meta.key_range(), (-2, 9));
    assert_eq!(meta.stream_ids, BTreeSet::from([1, 2]));
    assert_eq!(meta.source_ids, BTreeSet::from([0, 3]));
}

#[test]
fn analyze_does_not_assume_sorted_input() {
    let data = vec![rec(0, 0, 1, 50), rec(0, 0, 1, 5), rec(0, 0, 1, 20)];
    let meta = analyze(&data).unwrap();
    assert_eq!(meta.ts_range(), (5, 50));
}

// -------------------- merge --------------------

#[test]
fn merge_metadata_combines_pairwise() {
    let a = analyze(&[rec(1, 0, 5, 10), rec(1, 0, 5, 30)]).unwrap();
    let b = analyze(&[rec(2, 4, 9, 20)]).unwrap();
    let m = merge_metadata(&a, &b);

    assert_eq!(m.length, 3);
    assert_eq!(m.ts_range(), (10, 30));
    assert_eq!(m.key_range(), (5, 9));
    assert_eq!(m.stream_ids, BTreeSet::from([1, 2]));
    assert_eq!(m.source_ids, BTreeSet::from([0, 4]));

    // inputs untouched
    assert_eq!(a.length, 2);
    assert_eq!(b.length, 1);
}

#[test]
fn merge_metadata_matches_analyze_of_concatenation() {
    let a_data = vec![rec(1, 0, 5, 10), rec(3, 1, 50, 12)];
    let b_data = vec![rec(2, 2, -9, 11), rec(1, 0, 0, 99)];
    let merged = merge_metadata(&analyze(&a_data).unwrap(), &analyze(&b_data).unwrap());

    let mut all = a_data.clone();
    all.extend_from_slice(&b_data);
    assert_eq!(merged, analyze(&all).unwrap());
}

// -------------------- remap / hash --------------------

#[test]
fn remap_deduplicates() {
    let mut meta = analyze(&[rec(1, 0, 0, 0), rec(5, 0, 0, 1), rec(9, 0, 0, 2)]).unwrap();
    meta.remap_stream_ids(|id| id % 4);
    assert_eq!(meta.stream_ids, BTreeSet::from([1]));
}

#[test]
fn hash_streams_image_is_in_range() {
    let mut meta = analyze(&[rec(-3, 0, 0, 0), rec(7, 0, 0, 1), rec(12, 0, 0, 2)]).unwrap();
    meta.hash_streams(5).unwrap();
    // -3 mod 5 == 2, 7 mod 5 == 2, 12 mod 5 == 2
    assert_eq!(meta.stream_ids, BTreeSet::from([2]));
}

#[test]
fn hash_sources_rejects_non_positive_modulus() {
    let mut meta = analyze(&[rec(0, 3, 0, 0)]).unwrap();
    assert!(meta.hash_sources(0).unwrap_err().is_argument());
    assert!(meta.hash_sources(-2).unwrap_err().is_argument());
    assert_eq!(meta.source_ids, BTreeSet::from([3]));
}

#[test]
fn clone_is_deep() {
    let original = analyze(&[rec(1, 2, 0, 0), rec(3, 4, 0, 1)]).unwrap();
    let mut copy = original.clone();
    copy.hash_streams(2).unwrap();
    copy.source_ids.insert(99);

    assert_eq!(original.stream_ids, BTreeSet::from([1, 3]));
    assert_eq!(original.source_ids, BTreeSet::from([2, 4]));
}

// -------------------- time shift --------------------

#[test]
fn time_shift_moves_range() {
    let mut meta = analyze(&[rec(0, 0, 0, 10), rec(0, 0, 0, 15)]).unwrap();
    meta.time_shift(100).unwrap();
    assert_eq!(meta.ts_range(), (110, 115));
    meta.time_shift(-200).unwrap();
    assert_eq!(meta.ts_range(), (-90, -85));
}

#[test]
fn time_shift_overflow_leaves_metadata_unchanged() {
    let mut meta = analyze(&[rec(0, 0, 0, 10), rec(0, 0, 0, i32::MAX - 1)]).unwrap();
    let before = meta.clone();
    assert!(meta.time_shift(5).unwrap_err().is_argument());
    assert_eq!(meta, before);
}

// -------------------- is_sorted / display --------------------

#[test]
fn is_sorted_accepts_ties() {
    assert!(is_sorted(&[]));
    assert!(is_sorted(&[rec(0, 0, 0, 1), rec(0, 0, 0, 1), rec(0, 0, 0, 2)]));
    assert!(!is_sorted(&[rec(0, 0, 0, 2), rec(0, 0, 0, 1)]));
}

#[test]
fn record_display_marks_deletions() {
    let ins = Record::new(1, 2, 3, 1, 4);
    let del = Record::new(1, 2, 3, -1, 4);
    assert_eq!(ins.to_string(), "<1,INS[3],ts=4 at 2>");
    assert_eq!(del.to_string(), "<1,DEL[3],ts=4 at 2>");
}

// -------------------- properties --------------------

fn arb_record() -> impl Strategy<Value = Record> {
    (any::<i16>(), any::<i16>(), any::<i32>(), -3i32..3, -1000i32..1000)
        .prop_map(|(s, h, k, u, t)| Record::new(s, h, k, u, t))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn analyze_bounds_every_record(data in proptest::collection::vec(arb_record(), 1..200)) {
        let meta = analyze(&data).unwrap();
        prop_assert_eq!(meta.len(), data.len());
        for r in &data {
            prop_assert!(meta.ts_min <= r.timestamp && r.timestamp <= meta.ts_max);
            prop_assert!(meta.key_min <= r.key && r.key <= meta.key_max);
            prop_assert!(meta.stream_ids.contains(&r.stream_id));
            prop_assert!(meta.source_ids.contains(&r.source_id));
        }
    }

    #[test]
    fn hash_streams_is_image_of_original_set(
        data in proptest::collection::vec(arb_record(), 1..100),
        m in 1i16..50,
    ) {
        let mut meta = analyze(&data).unwrap();
        let expected: BTreeSet<i16> = meta.stream_ids.iter().map(|id| id.rem_euclid(m)).collect();
        meta.hash_streams(m).unwrap();
        prop_assert_eq!(&meta.stream_ids, &expected);
        prop_assert!(meta.stream_ids.iter().all(|&id| (0..m).contains(&id)));
    }
}
