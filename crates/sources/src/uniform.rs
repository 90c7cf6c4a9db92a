use dataset::StreamDataset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use record::{DdsError, Record, Result};

use crate::SourceAdapter;

/// Seeded synthetic source: one record per timestamp in `1..=max_time`, with
/// stream id, source id and key drawn uniformly from `[0, max)`.
///
/// The same parameters always produce the same dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSource {
    pub max_sid: i16,
    pub max_hid: i16,
    pub max_key: i32,
    pub max_time: i32,
    pub seed: u64,
}

impl UniformSource {
    pub fn new(max_sid: i16, max_hid: i16, max_key: i32, max_time: i32, seed: u64) -> Self {
        Self {
            max_sid,
            max_hid,
            max_key,
            max_time,
            seed,
        }
    }

    fn check(&self) -> Result<()> {
        if self.max_sid <= 0 || self.max_hid <= 0 || self.max_key <= 0 {
            return Err(DdsError::Argument(format!(
                "id bounds must be positive (max_sid={}, max_hid={}, max_key={})",
                self.max_sid, self.max_hid, self.max_key
            )));
        }
        if self.max_time <= 0 {
            return Err(DdsError::Argument(format!(
                "max_time must be positive, got {}",
                self.max_time
            )));
        }
        Ok(())
    }
}

impl SourceAdapter for UniformSource {
    fn load(&self) -> Result<StreamDataset> {
        self.check()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let records: Vec<Record> = (1..=self.max_time)
            .map(|ts| {
                Record::new(
                    rng.random_range(0..self.max_sid),
                    rng.random_range(0..self.max_hid),
                    rng.random_range(0..self.max_key),
                    1,
                    ts,
                )
            })
            .collect();

        let mut ds = StreamDataset::new(records)?;
        ds.annotate("origin", "uniform")?
            .annotate("seed", self.seed)?;
        info!(records = ds.len(), seed = self.seed, "generated uniform dataset");
        Ok(ds)
    }
}
