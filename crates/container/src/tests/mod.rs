
use dataset::{Record, StreamDataset};

pub fn sample_dataset(n: usize) -> StreamDataset {
    let records = (0..n)
        .map(|i| {
            Record::new(
                (i % 4) as i16,
                (i % 3) as i16 - 1,
                (i * 7 % 50) as i32 - 10,
                1,
                (i / 2) as i32 + 100,
            )
        })
        .collect();
    StreamDataset::new(records).unwrap()
}
