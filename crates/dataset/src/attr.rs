//! Annotation values attached to a dataset.
//!
//! Annotations carry provenance and free-form tags (`origin`, the fields a
//! source adapter mapped, a generator seed, ...). The dataset never interprets
//! them; the container codec stores them next to the reserved synopsis
//! attributes.

use std::fmt;

/// A typed annotation value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    Int16s(Vec<i16>),
    Int32s(Vec<i32>),
    Int64s(Vec<i64>),
    Floats(Vec<f64>),
}

impl AttrValue {
    /// Parses an operator-supplied string: an integer if it parses as one,
    /// then a float, otherwise text.
    pub fn parse(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            AttrValue::Int(i)
        } else if let Ok(f) = s.parse::<f64>() {
            AttrValue::Float(f)
        } else {
            AttrValue::Text(s.to_string())
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(v) => write!(f, "{:?}", v),
            AttrValue::Int16s(v) => write!(f, "{:?}", v),
            AttrValue::Int32s(v) => write!(f, "{:?}", v),
            AttrValue::Int64s(v) => write!(f, "{:?}", v),
            AttrValue::Floats(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(i64::from(v))
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Vec<i16>> for AttrValue {
    fn from(v: Vec<i16>) -> Self {
        AttrValue::Int16s(v)
    }
}

impl From<Vec<i32>> for AttrValue {
    fn from(v: Vec<i32>) -> Self {
        AttrValue::Int32s(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Int64s(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Floats(v)
    }
}
