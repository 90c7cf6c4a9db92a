//! Entry file format constants, header/footer codecs and the record
//! element encoding.
//!
//! ## Header
//!
//! ```text
//! [magic: u32 "DSA1"][version: u16][field_count: u8]
//! field_count × [name_len: u8][name][kind: u8]
//! [rank: u8] rank × [dim: u64]
//! [compression: u8][chunk_records: u32]
//! ```
//!
//! ## Footer (24 bytes)
//!
//! ```text
//! [attrs_offset: u64][data_offset: u64][chunk_count: u32][magic: u32 "DSA1"]
//! ```
//!
//! The reader checks the footer magic first, then parses the header from the
//! start of the file.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

use record::{DdsError, Record, Result};

/// Magic number identifying a dataset entry file (ASCII "DSA1").
pub const ENTRY_MAGIC: u32 = 0x4453_4131;

/// Current entry format version.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the footer in bytes: 8 + 8 + 4 + 4.
pub const FOOTER_BYTES: u64 = 8 + 8 + 4 + 4;

/// Largest chunk the writer produces, in records (16 MiB of raw data).
pub const MAX_CHUNK_RECORDS: usize = 1 << 20;

/// Upper bound on header fields and dimensions accepted when reading.
const MAX_HEADER_ITEMS: u8 = 32;

/// Storage type of one element field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldKind {
    I16 = 1,
    I32 = 2,
}

impl FieldKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::I16),
            2 => Some(Self::I32),
            _ => None,
        }
    }
}

/// Name and storage type of one element field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// The element layout of a stored [`Record`], in storage order.
pub fn record_layout() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("sid", FieldKind::I16),
        FieldSpec::new("hid", FieldKind::I16),
        FieldSpec::new("key", FieldKind::I32),
        FieldSpec::new("upd", FieldKind::I32),
        FieldSpec::new("ts", FieldKind::I32),
    ]
}

/// Chunk payload codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Codec {
    Raw = 0,
    Zstd = 1,
}

impl Codec {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Raw),
            1 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Parsed entry header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub fields: Vec<FieldSpec>,
    pub dims: Vec<u64>,
    pub compression: Codec,
    pub chunk_records: u32,
}

impl Header {
    /// Header of a one-dimensional record array of `length` elements.
    pub fn for_records(length: usize, compression: Codec, chunk_records: u32) -> Self {
        Self {
            fields: record_layout(),
            dims: vec![length as u64],
            compression,
            chunk_records,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(ENTRY_MAGIC)?;
        w.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        w.write_u8(self.fields.len() as u8)?;
        for field in &self.fields {
            w.write_u8(field.name.len() as u8)?;
            w.write_all(field.name.as_bytes())?;
            w.write_u8(field.kind as u8)?;
        }
        w.write_u8(self.dims.len() as u8)?;
        for &dim in &self.dims {
            w.write_u64::<LittleEndian>(dim)?;
        }
        w.write_u8(self.compression as u8)?;
        w.write_u32::<LittleEndian>(self.chunk_records)?;
        Ok(())
    }

    /// Parses a header.
    ///
    /// Unknown field kinds are reported as layout mismatches
    /// ([`DdsError::Validation`]); a wrong magic or version as corruption.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != ENTRY_MAGIC {
            return Err(DdsError::Corrupt(format!("bad header magic {:#x}", magic)));
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(DdsError::Corrupt(format!(
                "unsupported entry version {}",
                version
            )));
        }

        let field_count = r.read_u8()?;
        if field_count > MAX_HEADER_ITEMS {
            return Err(DdsError::Corrupt(format!(
                "field count {} exceeds maximum {}",
                field_count, MAX_HEADER_ITEMS
            )));
        }
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let name_len = r.read_u8()? as usize;
            let mut name = vec![0u8; name_len];
            r.read_exact(&mut name)?;
            let name = String::from_utf8(name)
                .map_err(|_| DdsError::Corrupt("field name is not UTF-8".to_string()))?;
            let raw_kind = r.read_u8()?;
            let kind = FieldKind::from_u8(raw_kind).ok_or_else(|| {
                DdsError::Validation(format!(
                    "field '{}' has unsupported storage type {}",
                    name, raw_kind
                ))
            })?;
            fields.push(FieldSpec { name, kind });
        }

        let rank = r.read_u8()?;
        if rank > MAX_HEADER_ITEMS {
            return Err(DdsError::Corrupt(format!(
                "rank {} exceeds maximum {}",
                rank, MAX_HEADER_ITEMS
            )));
        }
        let mut dims = Vec::with_capacity(rank as usize);
        for _ in 0..rank {
            dims.push(r.read_u64::<LittleEndian>()?);
        }

        let raw_codec = r.read_u8()?;
        let compression = Codec::from_u8(raw_codec)
            .ok_or_else(|| DdsError::Corrupt(format!("unknown compression {}", raw_codec)))?;
        let chunk_records = r.read_u32::<LittleEndian>()?;

        Ok(Self {
            fields,
            dims,
            compression,
            chunk_records,
        })
    }

    /// Checks that the stored array is a one-dimensional array of records and
    /// returns its length.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] on any layout or shape mismatch.
    pub fn validate_record_array(&self) -> Result<usize> {
        if self.fields != record_layout() {
            let stored: Vec<String> = self
                .fields
                .iter()
                .map(|f| format!("{}:{:?}", f.name, f.kind))
                .collect();
            return Err(DdsError::Validation(format!(
                "stored element layout [{}] does not match the record layout",
                stored.join(", ")
            )));
        }
        if self.dims.len() != 1 {
            return Err(DdsError::Validation(format!(
                "stored array has rank {}, expected 1",
                self.dims.len()
            )));
        }
        usize::try_from(self.dims[0])
            .map_err(|_| DdsError::Validation(format!("array length {} too large", self.dims[0])))
    }
}

/// Parsed entry footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub attrs_offset: u64,
    pub data_offset: u64,
    pub chunk_count: u32,
}

impl Footer {
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u64::<LittleEndian>(self.attrs_offset)?;
        w.write_u64::<LittleEndian>(self.data_offset)?;
        w.write_u32::<LittleEndian>(self.chunk_count)?;
        w.write_u32::<LittleEndian>(ENTRY_MAGIC)?;
        Ok(())
    }

    /// Reads the footer from the end of `r` and checks its offsets against the
    /// file size.
    pub fn read_from<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let filesize = r.seek(SeekFrom::End(0))?;
        if filesize < FOOTER_BYTES {
            return Err(DdsError::Corrupt("file too small for entry footer".to_string()));
        }

        r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
        let attrs_offset = r.read_u64::<LittleEndian>()?;
        let data_offset = r.read_u64::<LittleEndian>()?;
        let chunk_count = r.read_u32::<LittleEndian>()?;
        let magic = r.read_u32::<LittleEndian>()?;

        if magic != ENTRY_MAGIC {
            return Err(DdsError::Corrupt(format!("bad footer magic {:#x}", magic)));
        }
        if attrs_offset > data_offset || data_offset > filesize - FOOTER_BYTES {
            return Err(DdsError::Corrupt(format!(
                "invalid section offsets attrs={} data={} (file size {})",
                attrs_offset, data_offset, filesize
            )));
        }

        Ok(Self {
            attrs_offset,
            data_offset,
            chunk_count,
        })
    }
}

/// Appends the 16-byte little-endian encoding of `rec` to `buf`.
pub fn encode_record(buf: &mut Vec<u8>, rec: &Record) {
    buf.extend_from_slice(&rec.stream_id.to_le_bytes());
    buf.extend_from_slice(&rec.source_id.to_le_bytes());
    buf.extend_from_slice(&rec.key.to_le_bytes());
    buf.extend_from_slice(&rec.update.to_le_bytes());
    buf.extend_from_slice(&rec.timestamp.to_le_bytes());
}

/// Decodes records from `bytes`, whose length must be a multiple of
/// [`Record::ENCODED_LEN`].
pub fn decode_records(bytes: &[u8], out: &mut Vec<Record>) -> Result<()> {
    if bytes.len() % Record::ENCODED_LEN != 0 {
        return Err(DdsError::Corrupt(format!(
            "record block of {} bytes is not a multiple of {}",
            bytes.len(),
            Record::ENCODED_LEN
        )));
    }
    let mut cur = bytes;
    out.reserve(bytes.len() / Record::ENCODED_LEN);
    while !cur.is_empty() {
        out.push(Record {
            stream_id: cur.read_i16::<LittleEndian>()?,
            source_id: cur.read_i16::<LittleEndian>()?,
            key: cur.read_i32::<LittleEndian>()?,
            update: cur.read_i32::<LittleEndian>()?,
            timestamp: cur.read_i32::<LittleEndian>()?,
        });
    }
    Ok(())
}
