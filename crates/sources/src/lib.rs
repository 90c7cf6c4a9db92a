//! # Sources - native data adapters
//!
//! Adapters turn an external record source into a [`StreamDataset`]. Each
//! adapter's output is sorted by timestamp and carries an `origin`
//! annotation naming where it came from.
//!
//! | Adapter          | Input                                           |
//! |------------------|-------------------------------------------------|
//! | [`WcupSource`]   | WorldCup'98 access log in its native binary form |
//! | [`UniformSource`]| seeded uniform synthetic records                |

mod uniform;
mod wcup;

use dataset::StreamDataset;
use record::Result;

pub use uniform::UniformSource;
pub use wcup::{
    from_wcup, read_wcup_native, KeyField, SidField, WcupRecord, WcupSource, WCUP_RECORD_LEN,
};

/// Something that can produce a complete dataset.
pub trait SourceAdapter {
    /// Loads every record of the source into a new dataset.
    fn load(&self) -> Result<StreamDataset>;
}
