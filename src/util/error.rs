//! Error types for the scenepak library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive and codec operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Declared length exceeds the bytes that are actually available
    #[error("Truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Decompressed output does not have the declared length
    #[error("Decompression mismatch: expected {expected} bytes, produced {actual}")]
    DecompressionMismatch { expected: usize, actual: usize },

    /// Record signature does not match its content hash
    #[error("Signature mismatch for record '{0}'")]
    SignatureMismatch(String),

    /// Signature record is missing or malformed
    #[error("Invalid signature record for '{name}': {reason}")]
    InvalidSignatureRecord { name: String, reason: String },

    /// Codec header points past the end of its stream
    #[error("Header out of bounds: {0}")]
    HeaderOutOfBounds(String),

    /// Attribute array length disagrees with the vertex count
    #[error("Array length mismatch for '{channel}': expected {expected} elements, got {actual}")]
    ArrayLengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    /// Record not found by name
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Side-table metadata is inconsistent
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a header-out-of-bounds error.
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::HeaderOutOfBounds(msg.into())
    }

    /// Create an invalid metadata error.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

/// Result type alias for scenepak operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Truncated { offset: 12, needed: 100, available: 3 };
        let s = e.to_string();
        assert!(s.contains("12"));
        assert!(s.contains("100"));
        assert!(s.contains("3"));

        let e = Error::DecompressionMismatch { expected: 11, actual: 7 };
        assert!(e.to_string().contains("11"));

        let e = Error::ArrayLengthMismatch { channel: "normal".into(), expected: 9, actual: 6 };
        assert!(e.to_string().contains("normal"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
