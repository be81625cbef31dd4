//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in engine operations.
///
/// A key that has never been written is **not** an error; `get` returns
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Segment file layer error.
    #[error("storage error: {0}")]
    Storage(#[from] firkin_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The index and a segment disagree: an index entry pointed at a
    /// location that does not hold a complete record.
    #[error("segment corruption: {message}")]
    Corruption {
        /// Description of the inconsistency.
        message: String,
    },
}

impl EngineError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }
}
