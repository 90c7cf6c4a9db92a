use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use dataset::{check_annotation_name, StreamDataset};
use std::fs::{rename, File, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tracing::debug;

use record::{DdsError, Result};

use crate::attrs::{reserved_attrs, write_attrs};
use crate::format::{encode_record, Codec, Footer, Header, MAX_CHUNK_RECORDS};
use crate::{Compression, WriteOptions};

/// Writes a [`StreamDataset`] to disk as one immutable entry file.
///
/// The writer is stateless: all work happens inside
/// [`write_dataset`](EntryWriter::write_dataset).
pub struct EntryWriter {}

impl EntryWriter {
    /// Writes `ds` to `path`, replacing any existing file.
    ///
    /// # File Layout
    ///
    /// ```text
    /// [HEADER] see `format`
    /// [ATTRS]  reserved synopsis attributes followed by the annotations
    /// [DATA]   repeated: crc32(u32) | codec(u8) | record_count(u32) | payload_len(u32) | payload
    /// [FOOTER] attrs_offset(u64) | data_offset(u64) | chunk_count(u32) | magic(u32 = "DSA1")
    /// ```
    ///
    /// The CRC32 covers everything after itself in the chunk. A zstd chunk
    /// that does not shrink is stored raw.
    ///
    /// # Crash Safety
    ///
    /// Writes to `path.tmp`, calls `sync_all()`, then atomically renames and
    /// syncs the parent directory. A crash mid-write leaves only the temp
    /// file behind.
    ///
    /// # Errors
    ///
    /// Returns [`DdsError::Validation`] if an annotation uses a reserved name,
    /// or any I/O failure.
    pub fn write_dataset(path: &Path, ds: &StreamDataset, opts: &WriteOptions) -> Result<()> {
        for name in ds.annotations().keys() {
            check_annotation_name(name)?;
        }
        let chunk_records = opts.chunk_records.clamp(1, MAX_CHUNK_RECORDS);
        let codec = match opts.compression {
            Compression::None => Codec::Raw,
            Compression::Zstd(_) => Codec::Zstd,
        };

        let tmp_path = tmp_path_for(path);
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        Header::for_records(ds.len(), codec, chunk_records as u32).write_to(&mut file)?;

        let attrs_offset = file.stream_position()?;
        let reserved = reserved_attrs(ds.metadata());
        let all: Vec<(&str, &dataset::AttrValue)> = reserved
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .chain(ds.annotations().iter().map(|(k, v)| (k.as_str(), v)))
            .collect();
        write_attrs(&mut file, all.into_iter())?;

        let data_offset = file.stream_position()?;
        let mut raw = Vec::with_capacity(chunk_records * record::Record::ENCODED_LEN);
        let mut body = Vec::new();
        let mut chunk_count: u32 = 0;
        let mut stored_bytes: u64 = 0;

        for chunk in ds.records().chunks(chunk_records) {
            raw.clear();
            for rec in chunk {
                encode_record(&mut raw, rec);
            }

            let (chunk_codec, payload) = match opts.compression {
                Compression::Zstd(level) => {
                    let packed = zstd::bulk::compress(&raw, level)?;
                    if packed.len() < raw.len() {
                        (Codec::Zstd, packed)
                    } else {
                        (Codec::Raw, raw.clone())
                    }
                }
                Compression::None => (Codec::Raw, raw.clone()),
            };

            body.clear();
            body.write_u8(chunk_codec as u8)?;
            body.write_u32::<LittleEndian>(chunk.len() as u32)?;
            body.write_u32::<LittleEndian>(payload.len() as u32)?;
            body.extend_from_slice(&payload);

            let mut hasher = Crc32::new();
            hasher.update(&body);
            file.write_u32::<LittleEndian>(hasher.finalize())?;
            file.write_all(&body)?;

            chunk_count += 1;
            stored_bytes += payload.len() as u64;
        }

        Footer {
            attrs_offset,
            data_offset,
            chunk_count,
        }
        .write_to(&mut file)?;

        file.flush()?;
        file.into_inner().map_err(|e| DdsError::Io(e.into_error()))?.sync_all()?;

        rename(&tmp_path, path)?;
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(
            path = %path.display(),
            records = ds.len(),
            chunks = chunk_count,
            stored_bytes,
            "entry written"
        );
        Ok(())
    }
}

/// `<name>.dds` becomes `<name>.dds.tmp`.
pub(crate) fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    os.into()
}
