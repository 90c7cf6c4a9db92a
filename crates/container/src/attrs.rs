//! Attribute section codec and the mapping between reserved attributes and
//! [`Metadata`].
//!
//! ```text
//! [attr_count: u32]
//! attr_count × [name_len: u16][name][tag: u8][payload]
//! ```
//!
//! Payloads: scalars are stored inline (`i64`/`f64`), text and arrays are
//! prefixed with a `u32` element count.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dataset::AttrValue;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use record::{DdsError, Metadata, Result};

/// Maximum text length or array element count accepted when reading (1 Mi).
/// Prevents huge allocations on corrupt files.
const MAX_ATTR_ELEMS: usize = 1024 * 1024;

const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_TEXT: u8 = 3;
const TAG_INT16S: u8 = 4;
const TAG_INT32S: u8 = 5;
const TAG_INT64S: u8 = 6;
const TAG_FLOATS: u8 = 7;

/// The reserved attributes describing `meta`, in storage order.
pub fn reserved_attrs(meta: &Metadata) -> Vec<(String, AttrValue)> {
    vec![
        (
            "ts_range".to_string(),
            AttrValue::Int32s(vec![meta.ts_min, meta.ts_max]),
        ),
        (
            "key_range".to_string(),
            AttrValue::Int32s(vec![meta.key_min, meta.key_max]),
        ),
        (
            "stream_ids".to_string(),
            AttrValue::Int16s(meta.stream_ids.iter().copied().collect()),
        ),
        (
            "source_ids".to_string(),
            AttrValue::Int16s(meta.source_ids.iter().copied().collect()),
        ),
    ]
}

/// Splits stored attributes into the dataset metadata and the remaining
/// user annotations.
///
/// # Errors
///
/// Returns [`DdsError::Validation`] if a reserved attribute is missing or has
/// the wrong type or shape.
pub fn split_reserved(
    length: usize,
    mut attrs: BTreeMap<String, AttrValue>,
) -> Result<(Metadata, BTreeMap<String, AttrValue>)> {
    let (ts_min, ts_max) = take_pair(&mut attrs, "ts_range")?;
    let (key_min, key_max) = take_pair(&mut attrs, "key_range")?;
    let stream_ids = take_ids(&mut attrs, "stream_ids")?;
    let source_ids = take_ids(&mut attrs, "source_ids")?;

    let meta = Metadata {
        length,
        ts_min,
        ts_max,
        key_min,
        key_max,
        stream_ids,
        source_ids,
    };
    Ok((meta, attrs))
}

fn take_pair(attrs: &mut BTreeMap<String, AttrValue>, name: &str) -> Result<(i32, i32)> {
    match attrs.remove(name) {
        Some(AttrValue::Int32s(v)) if v.len() == 2 => Ok((v[0], v[1])),
        Some(other) => Err(DdsError::Validation(format!(
            "attribute '{}' must be two int32 values, found {}",
            name, other
        ))),
        None => Err(DdsError::Validation(format!(
            "missing attribute '{}'",
            name
        ))),
    }
}

fn take_ids(attrs: &mut BTreeMap<String, AttrValue>, name: &str) -> Result<BTreeSet<i16>> {
    match attrs.remove(name) {
        Some(AttrValue::Int16s(v)) => Ok(v.into_iter().collect()),
        Some(other) => Err(DdsError::Validation(format!(
            "attribute '{}' must be an int16 array, found {}",
            name, other
        ))),
        None => Err(DdsError::Validation(format!(
            "missing attribute '{}'",
            name
        ))),
    }
}

/// Writes the attribute section.
pub fn write_attrs<'a, W, I>(w: &mut W, attrs: I) -> Result<()>
where
    W: Write,
    I: ExactSizeIterator<Item = (&'a str, &'a AttrValue)>,
{
    w.write_u32::<LittleEndian>(attrs.len() as u32)?;
    for (name, value) in attrs {
        if name.len() > usize::from(u16::MAX) {
            return Err(DdsError::Argument(format!(
                "attribute name of {} bytes is too long",
                name.len()
            )));
        }
        w.write_u16::<LittleEndian>(name.len() as u16)?;
        w.write_all(name.as_bytes())?;
        write_value(w, value)?;
    }
    Ok(())
}

fn write_len<W: Write>(w: &mut W, n: usize) -> Result<()> {
    if n > MAX_ATTR_ELEMS {
        return Err(DdsError::Argument(format!(
            "attribute of {} elements exceeds maximum {}",
            n, MAX_ATTR_ELEMS
        )));
    }
    w.write_u32::<LittleEndian>(n as u32)?;
    Ok(())
}

fn write_value<W: Write>(w: &mut W, value: &AttrValue) -> Result<()> {
    match value {
        AttrValue::Int(v) => {
            w.write_u8(TAG_INT)?;
            w.write_i64::<LittleEndian>(*v)?;
        }
        AttrValue::Float(v) => {
            w.write_u8(TAG_FLOAT)?;
            w.write_f64::<LittleEndian>(*v)?;
        }
        AttrValue::Text(s) => {
            w.write_u8(TAG_TEXT)?;
            write_len(w, s.len())?;
            w.write_all(s.as_bytes())?;
        }
        AttrValue::Int16s(v) => {
            w.write_u8(TAG_INT16S)?;
            write_len(w, v.len())?;
            for &x in v {
                w.write_i16::<LittleEndian>(x)?;
            }
        }
        AttrValue::Int32s(v) => {
            w.write_u8(TAG_INT32S)?;
            write_len(w, v.len())?;
            for &x in v {
                w.write_i32::<LittleEndian>(x)?;
            }
        }
        AttrValue::Int64s(v) => {
            w.write_u8(TAG_INT64S)?;
            write_len(w, v.len())?;
            for &x in v {
                w.write_i64::<LittleEndian>(x)?;
            }
        }
        AttrValue::Floats(v) => {
            w.write_u8(TAG_FLOATS)?;
            write_len(w, v.len())?;
            for &x in v {
                w.write_f64::<LittleEndian>(x)?;
            }
        }
    }
    Ok(())
}

/// Reads the attribute section.
pub fn read_attrs<R: Read>(r: &mut R) -> Result<BTreeMap<String, AttrValue>> {
    let count = r.read_u32::<LittleEndian>()? as usize;
    if count > MAX_ATTR_ELEMS {
        return Err(DdsError::Corrupt(format!(
            "attribute count {} exceeds maximum {}",
            count, MAX_ATTR_ELEMS
        )));
    }

    let mut attrs = BTreeMap::new();
    for _ in 0..count {
        let name_len = r.read_u16::<LittleEndian>()? as usize;
        let mut name = vec![0u8; name_len];
        r.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|_| DdsError::Corrupt("attribute name is not UTF-8".to_string()))?;
        let value = read_value(r)?;
        attrs.insert(name, value);
    }
    Ok(attrs)
}

fn read_len<R: Read>(r: &mut R) -> Result<usize> {
    let n = r.read_u32::<LittleEndian>()? as usize;
    if n > MAX_ATTR_ELEMS {
        return Err(DdsError::Corrupt(format!(
            "attribute length {} exceeds maximum {}",
            n, MAX_ATTR_ELEMS
        )));
    }
    Ok(n)
}

fn read_value<R: Read>(r: &mut R) -> Result<AttrValue> {
    let tag = r.read_u8()?;
    let value = match tag {
        TAG_INT => AttrValue::Int(r.read_i64::<LittleEndian>()?),
        TAG_FLOAT => AttrValue::Float(r.read_f64::<LittleEndian>()?),
        TAG_TEXT => {
            let mut buf = vec![0u8; read_len(r)?];
            r.read_exact(&mut buf)?;
            AttrValue::Text(
                String::from_utf8(buf)
                    .map_err(|_| DdsError::Corrupt("text attribute is not UTF-8".to_string()))?,
            )
        }
        TAG_INT16S => {
            let n = read_len(r)?;
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(r.read_i16::<LittleEndian>()?);
            }
            AttrValue::Int16s(v)
        }
        TAG_INT32S => {
            let n = read_len(r)?;
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(r.read_i32::<LittleEndian>()?);
            }
            AttrValue::Int32s(v)
        }
        TAG_INT64S => {
            let n = read_len(r)?;
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(r.read_i64::<LittleEndian>()?);
            }
            AttrValue::Int64s(v)
        }
        TAG_FLOATS => {
            let n = read_len(r)?;
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                v.push(r.read_f64::<LittleEndian>()?);
            }
            AttrValue::Floats(v)
        }
        other => return Err(DdsError::Corrupt(format!("unknown attribute tag {}", other))),
    };
    Ok(value)
}
