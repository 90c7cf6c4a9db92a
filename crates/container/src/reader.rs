use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use dataset::StreamDataset;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

use record::{DdsError, Record, Result};

use crate::attrs::{read_attrs, split_reserved};
use crate::format::{decode_records, Codec, Footer, Header};

/// Maximum chunk payload we'll allocate during reads (64 MiB). Prevents OOM
/// on corrupt files.
const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

/// Reads entry files written by [`EntryWriter`](crate::writer::EntryWriter).
pub struct EntryReader {}

impl EntryReader {
    /// Loads the dataset stored at `path`.
    ///
    /// The header is checked against the record layout before any data is
    /// read. The metadata is rebuilt from the stored attributes, not by
    /// scanning the records.
    ///
    /// # Errors
    ///
    /// - [`DdsError::Validation`] if the stored element layout differs from
    ///   the record layout, the array is not one-dimensional, or a reserved
    ///   attribute is missing or malformed.
    /// - [`DdsError::Corrupt`] on a checksum mismatch or inconsistent sizes.
    /// - [`DdsError::Io`] on any I/O failure.
    pub fn read_dataset(path: &Path) -> Result<StreamDataset> {
        let mut f = BufReader::new(File::open(path)?);

        let footer = Footer::read_from(&mut f)?;

        f.seek(SeekFrom::Start(0))?;
        let header = Header::read_from(&mut f)?;
        let length = header.validate_record_array()?;
        if f.stream_position()? != footer.attrs_offset {
            return Err(DdsError::Corrupt(format!(
                "header ends at {}, attributes recorded at {}",
                f.stream_position()?,
                footer.attrs_offset
            )));
        }

        let attrs = read_attrs(&mut f)?;
        let (meta, annotations) = split_reserved(length, attrs)?;

        f.seek(SeekFrom::Start(footer.data_offset))?;
        let mut records: Vec<Record> =
            Vec::with_capacity(length.min(MAX_CHUNK_BYTES / Record::ENCODED_LEN));
        for index in 0..footer.chunk_count {
            read_chunk(&mut f, index, &mut records)?;
            if records.len() > length {
                return Err(DdsError::Corrupt(format!(
                    "chunks hold more than the {} recorded elements",
                    length
                )));
            }
        }
        if records.len() != length {
            return Err(DdsError::Corrupt(format!(
                "chunks hold {} records, header records {}",
                records.len(),
                length
            )));
        }

        debug!(
            path = %path.display(),
            records = length,
            chunks = footer.chunk_count,
            "entry read"
        );
        StreamDataset::from_parts(records, meta, annotations)
    }
}

fn read_chunk<R: Read>(r: &mut R, index: u32, out: &mut Vec<Record>) -> Result<()> {
    let stored_crc = r.read_u32::<LittleEndian>()?;
    let raw_codec = r.read_u8()?;
    let record_count = r.read_u32::<LittleEndian>()?;
    let payload_len = r.read_u32::<LittleEndian>()? as usize;
    if payload_len > MAX_CHUNK_BYTES {
        return Err(DdsError::Corrupt(format!(
            "chunk {}: payload_len {} exceeds maximum {}",
            index, payload_len, MAX_CHUNK_BYTES
        )));
    }
    let mut payload = vec![0u8; payload_len];
    r.read_exact(&mut payload)?;

    let mut hasher = Crc32::new();
    hasher.update(&[raw_codec]);
    hasher.update(&record_count.to_le_bytes());
    hasher.update(&(payload_len as u32).to_le_bytes());
    hasher.update(&payload);
    let actual_crc = hasher.finalize();
    if actual_crc != stored_crc {
        return Err(DdsError::Corrupt(format!(
            "chunk {}: CRC mismatch (expected {:#010x}, got {:#010x})",
            index, stored_crc, actual_crc
        )));
    }

    let raw_len = record_count as usize * Record::ENCODED_LEN;
    if raw_len > MAX_CHUNK_BYTES {
        return Err(DdsError::Corrupt(format!(
            "chunk {}: {} records exceed the chunk size limit",
            index, record_count
        )));
    }
    let raw = match Codec::from_u8(raw_codec) {
        Some(Codec::Raw) => payload,
        Some(Codec::Zstd) => zstd::bulk::decompress(&payload, raw_len)
            .map_err(|e| DdsError::Corrupt(format!("chunk {}: {}", index, e)))?,
        None => {
            return Err(DdsError::Corrupt(format!(
                "chunk {}: unknown codec {}",
                index, raw_codec
            )))
        }
    };
    if raw.len() != raw_len {
        return Err(DdsError::Corrupt(format!(
            "chunk {}: {} bytes decoded, {} records recorded",
            index,
            raw.len(),
            record_count
        )));
    }
    decode_records(&raw, out)
}
