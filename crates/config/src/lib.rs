//! Runtime configuration read from environment variables.
//!
//! ```text
//! DDS_CONTAINER      container directory      (default: "data/dds")
//! DDS_COMPRESSION    "zstd" or "none"         (default: "zstd")
//! DDS_ZSTD_LEVEL     zstd compression level   (default: 3)
//! DDS_CHUNK_RECORDS  records per data chunk   (default: 65536)
//! ```
//!
//! Unparsable values fall back to their defaults.

use container::{Compression, WriteOptions, DEFAULT_CHUNK_RECORDS, DEFAULT_ZSTD_LEVEL};
use std::path::PathBuf;

pub const ENV_CONTAINER: &str = "DDS_CONTAINER";
pub const ENV_COMPRESSION: &str = "DDS_COMPRESSION";
pub const ENV_ZSTD_LEVEL: &str = "DDS_ZSTD_LEVEL";
pub const ENV_CHUNK_RECORDS: &str = "DDS_CHUNK_RECORDS";

pub const DEFAULT_CONTAINER: &str = "data/dds";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub container_dir: PathBuf,
    pub compression: Compression,
    pub chunk_records: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_dir: PathBuf::from(DEFAULT_CONTAINER),
            compression: Compression::Zstd(DEFAULT_ZSTD_LEVEL),
            chunk_records: DEFAULT_CHUNK_RECORDS,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let container_dir = PathBuf::from(env_or(ENV_CONTAINER, DEFAULT_CONTAINER));
        let level: i32 = env_or(ENV_ZSTD_LEVEL, "")
            .parse()
            .unwrap_or(DEFAULT_ZSTD_LEVEL);
        let compression = match env_or(ENV_COMPRESSION, "zstd").to_ascii_lowercase().as_str() {
            "none" | "raw" => Compression::None,
            _ => Compression::Zstd(level),
        };
        let chunk_records = match env_or(ENV_CHUNK_RECORDS, "").parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => DEFAULT_CHUNK_RECORDS,
        };

        Self {
            container_dir,
            compression,
            chunk_records,
        }
    }

    #[must_use]
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compression: self.compression,
            chunk_records: self.chunk_records,
        }
    }
}
