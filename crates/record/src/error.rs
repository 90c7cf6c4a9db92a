//! Error and Result types shared by the stream dataset crates.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for dataset operations.
pub type Result<T> = std::result::Result<T, DdsError>;

/// Errors raised by dataset construction, transforms and persistence.
///
/// Every failure is reported synchronously to the caller of the offending
/// operation. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum DdsError {
    /// Input or stored data does not satisfy a structural requirement
    /// (record layout, array rank, reserved attribute names, empty input).
    #[error("validation failure: {0}")]
    Validation(String),

    /// An argument is out of range or inconsistent with its peers
    /// (mismatched column lengths, non-positive modulus, overflow).
    #[error("argument failure: {0}")]
    Argument(String),

    /// Stored bytes failed an integrity check.
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// A named container entry does not exist.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl DdsError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DdsError::Validation(msg.into())
    }

    /// Returns `true` for [`DdsError::Validation`].
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, DdsError::Validation(_))
    }

    /// Returns `true` for [`DdsError::Argument`].
    #[must_use]
    pub fn is_argument(&self) -> bool {
        matches!(self, DdsError::Argument(_))
    }
}
