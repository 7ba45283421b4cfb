//! Error types for dgnrust library

use std::io;
use thiserror::Error;

/// Main error type for dgnrust operations
#[derive(Debug, Error)]
pub enum DgnError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a DGN header record
    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    /// Invalid file format
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// A record could not be decoded
    #[error("Malformed element of type {element_type}: {message}")]
    MalformedElement { element_type: u8, message: String },

    /// A read stopped before the declared end of a record
    #[error("Truncated record: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A field access fell outside of the record buffer
    #[error("Field at offset {offset} (+{len}) is outside of a {size} byte record")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// The caller asked for something the element or session cannot provide
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// An argument was out of its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

impl DgnError {
    /// Shorthand for a [`DgnError::MalformedElement`].
    pub fn malformed(element_type: u8, message: impl Into<String>) -> Self {
        DgnError::MalformedElement {
            element_type,
            message: message.into(),
        }
    }
}

/// Result type alias for dgnrust operations
pub type Result<T> = std::result::Result<T, DgnError>;

impl From<String> for DgnError {
    fn from(s: String) -> Self {
        DgnError::Custom(s)
    }
}

impl From<&str> for DgnError {
    fn from(s: &str) -> Self {
        DgnError::Custom(s.to_string())
    }
}
