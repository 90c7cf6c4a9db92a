use crate::{Record, StreamDataset};

pub fn rec(sid: i16, hid: i16, key: i32, upd: i32, ts: i32) -> Record {
    Record::new(sid, hid, key, upd, ts)
}

/// A dataset with one record per timestamp in `ts`, ids cycling over
/// `0..nstreams`.
pub fn dataset_at(ts: &[i32], nstreams: i16) -> StreamDataset {
    let records = ts
        .iter()
        .enumerate()
        .map(|(i, &t)| rec(i as i16 % nstreams, (i % 3) as i16, i as i32, 1, t))
        .collect();
    StreamDataset::new(records).unwrap()
}

pub fn timestamps(ds: &StreamDataset) -> Vec<i32> {
    ds.iter().map(|r| r.timestamp).collect()
}
