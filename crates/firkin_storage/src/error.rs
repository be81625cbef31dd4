//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// A truncated record is deliberately **not** an error; it is reported as
/// [`crate::ReadOutcome::Truncated`] so callers can distinguish an expected
/// partial tail from a real failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A key or value was too large to frame with a 32-bit length prefix.
    #[error("record field too large: {len} bytes exceeds i32::MAX")]
    RecordTooLarge {
        /// Length of the offending key or value.
        len: usize,
    },
}
