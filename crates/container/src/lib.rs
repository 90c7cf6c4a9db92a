//! # Container - named, on-disk dataset entries
//!
//! A [`Container`] is a directory holding one immutable entry file per
//! dataset (`<name>.dds`). Each entry stores the record array, the reserved
//! synopsis attributes and the dataset's annotations, so a dataset read back
//! is equal to the one written.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER                                                        │
//! │ magic "DSA1" | version | element fields | rank | dims          │
//! │ compression | chunk_records                                   │
//! ├───────────────────────────────────────────────────────────────┤
//! │ ATTRS                                                         │
//! │ ts_range | key_range | stream_ids | source_ids | annotations  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ DATA (one chunk per `chunk_records` records)                  │
//! │ crc32 | codec | record_count | payload_len | payload          │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 24 bytes)                                 │
//! │ attrs_offset | data_offset | chunk_count | magic "DSA1"        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Each record is 16 bytes:
//! `stream_id i16 | source_id i16 | key i32 | update i32 | timestamp i32`.

mod attrs;
mod format;
mod reader;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use dataset::StreamDataset;
use record::{DdsError, Result};

pub use format::{
    Codec, FieldKind, FieldSpec, Footer, Header, ENTRY_MAGIC, FOOTER_BYTES, FORMAT_VERSION,
};
pub use reader::EntryReader;
pub use writer::EntryWriter;

/// File extension of entry files.
pub const ENTRY_EXT: &str = "dds";

/// Default number of records per chunk.
pub const DEFAULT_CHUNK_RECORDS: usize = 64 * 1024;

/// Default zstd compression level.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Chunk compression applied on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    /// zstd at the given level.
    Zstd(i32),
}

/// How entries are encoded on write. Reading needs no options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub compression: Compression,
    pub chunk_records: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Zstd(DEFAULT_ZSTD_LEVEL),
            chunk_records: DEFAULT_CHUNK_RECORDS,
        }
    }
}

/// A directory of named dataset entries.
///
/// Concurrent writers of the same directory are not supported.
#[derive(Debug, Clone)]
pub struct Container {
    root: PathBuf,
    options: WriteOptions,
}

impl Container {
    /// Opens (creating if needed) the container directory at `dir` with
    /// default write options.
    ///
    /// Temp files left behind by an interrupted write are removed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::with_options(dir, WriteOptions::default())
    }

    /// Opens the container directory with explicit write options.
    pub fn with_options<P: AsRef<Path>>(dir: P, options: WriteOptions) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let tmp_suffix = format!(".{}.tmp", ENTRY_EXT);
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            let is_tmp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&tmp_suffix));
            if is_tmp {
                warn!(path = %path.display(), "removing stale temp file");
                fs::remove_file(&path)?;
            }
        }

        Ok(Self { root, options })
    }

    /// The container directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Path of the entry file for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if `name` is not a valid entry name.
    pub fn entry_path(&self, name: &str) -> Result<PathBuf> {
        check_entry_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, ENTRY_EXT)))
    }

    /// `true` if an entry called `name` exists.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.entry_path(name)?.is_file())
    }

    /// Names of all entries, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if check_entry_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Stores `ds` as entry `name`, replacing any existing entry.
    pub fn write(&self, ds: &StreamDataset, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        if path.exists() {
            warn!(entry = name, "overwriting existing entry");
        }
        EntryWriter::write_dataset(&path, ds, &self.options)?;
        info!(entry = name, records = ds.len(), "entry stored");
        Ok(())
    }

    /// Loads entry `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::NotFound`] if no such entry exists, plus every
    /// error of [`EntryReader::read_dataset`].
    pub fn read(&self, name: &str) -> Result<StreamDataset> {
        let path = self.entry_path(name)?;
        if !path.is_file() {
            return Err(DdsError::NotFound(name.to_string()));
        }
        let ds = EntryReader::read_dataset(&path)?;
        info!(entry = name, records = ds.len(), "entry loaded");
        Ok(ds)
    }

    /// Deletes entry `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::NotFound`] if no such entry exists.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        if !path.is_file() {
            return Err(DdsError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        info!(entry = name, "entry removed");
        Ok(())
    }
}

/// Checks that `name` is non-empty, made of `[A-Za-z0-9_.-]` and does not
/// start with `.`.
pub fn check_entry_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if name.is_empty() || name.starts_with('.') || !valid_chars {
        return Err(DdsError::Validation(format!(
            "invalid entry name '{}'",
            name
        )));
    }
    Ok(())
}

/// Writes `ds` to an entry file at an explicit path.
pub fn write_entry(path: &Path, ds: &StreamDataset, options: &WriteOptions) -> Result<()> {
    EntryWriter::write_dataset(path, ds, options)
}

/// Reads the entry file at an explicit path.
pub fn read_entry(path: &Path) -> Result<StreamDataset> {
    EntryReader::read_dataset(path)
}

#[cfg(test)]
mod tests;
