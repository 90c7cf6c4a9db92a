//! WorldCup'98 access logs.
//!
//! The native format is a flat array of 20-byte big-endian records:
//!
//! ```text
//! timestamp u32 | client_id u32 | object_id u32 | size u32 | method u8 | status u8 | type u8 | server u8
//! ```

use byteorder::{BigEndian, ReadBytesExt};
use dataset::StreamDataset;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use record::{DdsError, Record, Result};

use crate::SourceAdapter;

/// Size of one native record in bytes.
pub const WCUP_RECORD_LEN: usize = 20;

/// One native WorldCup'98 log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WcupRecord {
    pub timestamp: u32,
    pub client_id: u32,
    pub object_id: u32,
    pub size: u32,
    pub method: u8,
    pub status: u8,
    pub kind: u8,
    pub server: u8,
}

impl WcupRecord {
    /// Decodes one record from exactly [`WCUP_RECORD_LEN`] bytes.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        Ok(Self {
            timestamp: buf.read_u32::<BigEndian>()?,
            client_id: buf.read_u32::<BigEndian>()?,
            object_id: buf.read_u32::<BigEndian>()?,
            size: buf.read_u32::<BigEndian>()?,
            method: buf.read_u8()?,
            status: buf.read_u8()?,
            kind: buf.read_u8()?,
            server: buf.read_u8()?,
        })
    }

    /// Appends the native encoding of this record to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.client_id.to_be_bytes());
        buf.extend_from_slice(&self.object_id.to_be_bytes());
        buf.extend_from_slice(&self.size.to_be_bytes());
        buf.extend_from_slice(&[self.method, self.status, self.kind, self.server]);
    }
}

/// Log field used as the stream id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidField {
    #[default]
    Type,
    Method,
    Status,
}

impl SidField {
    fn pick(self, r: &WcupRecord) -> i16 {
        match self {
            SidField::Type => i16::from(r.kind),
            SidField::Method => i16::from(r.method),
            SidField::Status => i16::from(r.status),
        }
    }
}

impl FromStr for SidField {
    type Err = DdsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "type" => Ok(SidField::Type),
            "method" => Ok(SidField::Method),
            "status" => Ok(SidField::Status),
            other => Err(DdsError::Argument(format!(
                "unknown stream id field '{}' (expected type, method or status)",
                other
            ))),
        }
    }
}

impl fmt::Display for SidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SidField::Type => "type",
            SidField::Method => "method",
            SidField::Status => "status",
        };
        f.write_str(name)
    }
}

/// Log field used as the record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyField {
    #[default]
    ClientId,
    ObjectId,
}

impl KeyField {
    // Ids are opaque; values above i32::MAX wrap.
    fn pick(self, r: &WcupRecord) -> i32 {
        match self {
            KeyField::ClientId => r.client_id as i32,
            KeyField::ObjectId => r.object_id as i32,
        }
    }
}

impl FromStr for KeyField {
    type Err = DdsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "client_id" | "clientID" => Ok(KeyField::ClientId),
            "object_id" | "objectID" => Ok(KeyField::ObjectId),
            other => Err(DdsError::Argument(format!(
                "unknown key field '{}' (expected client_id or object_id)",
                other
            ))),
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyField::ClientId => "client_id",
            KeyField::ObjectId => "object_id",
        };
        f.write_str(name)
    }
}

/// Reads a native log file into memory.
///
/// # Errors
///
/// Returns [`DdsError::Corrupt`] if the file size is not a multiple of
/// [`WCUP_RECORD_LEN`].
pub fn read_wcup_native(path: &Path) -> Result<Vec<WcupRecord>> {
    let bytes = fs::read(path)?;
    if bytes.len() % WCUP_RECORD_LEN != 0 {
        return Err(DdsError::Corrupt(format!(
            "{}: {} bytes is not a whole number of {}-byte records",
            path.display(),
            bytes.len(),
            WCUP_RECORD_LEN
        )));
    }
    bytes.chunks_exact(WCUP_RECORD_LEN).map(WcupRecord::decode).collect()
}

/// Converts native log records into a dataset.
///
/// `stream_id` comes from `sid_field`, `source_id` from the server, `key`
/// from `key_field`; every update is `1`. The dataset is annotated with
/// `origin`, `sid_field` and `key_field`.
///
/// # Errors
///
/// Returns [`DdsError::Validation`] if `log` is empty, or
/// [`DdsError::Corrupt`] if a timestamp does not fit an `i32`.
pub fn from_wcup(
    log: &[WcupRecord],
    origin: &str,
    sid_field: SidField,
    key_field: KeyField,
) -> Result<StreamDataset> {
    let records = log
        .iter()
        .map(|r| {
            let ts = i32::try_from(r.timestamp).map_err(|_| {
                DdsError::Corrupt(format!("timestamp {} out of range", r.timestamp))
            })?;
            Ok(Record::new(
                sid_field.pick(r),
                i16::from(r.server),
                key_field.pick(r),
                1,
                ts,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut ds = StreamDataset::from_unsorted(records)?;
    ds.annotate("origin", origin)?
        .annotate("sid_field", sid_field.to_string())?
        .annotate("key_field", key_field.to_string())?;
    Ok(ds)
}

/// A WorldCup'98 log file on disk.
#[derive(Debug, Clone)]
pub struct WcupSource {
    pub path: PathBuf,
    pub sid_field: SidField,
    pub key_field: KeyField,
}

impl WcupSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sid_field: SidField::default(),
            key_field: KeyField::default(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, sid_field: SidField, key_field: KeyField) -> Self {
        self.sid_field = sid_field;
        self.key_field = key_field;
        self
    }
}

impl SourceAdapter for WcupSource {
    fn load(&self) -> Result<StreamDataset> {
        let log = read_wcup_native(&self.path)?;
        let origin = self.path.display().to_string();
        let ds = from_wcup(&log, &origin, self.sid_field, self.key_field)?;
        info!(
            path = %self.path.display(),
            records = ds.len(),
            sid_field = %self.sid_field,
            key_field = %self.key_field,
            "loaded worldcup log"
        );
        Ok(ds)
    }
}
