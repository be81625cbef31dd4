//! Record framing.
//!
//! ## Record Format
//!
//! ```text
//! | key_len (i32 LE) | value_len (i32 LE) | key bytes | value bytes |
//! ```
//!
//! Lengths are fixed-width signed 32-bit so the file can be scanned without
//! a separate index. Negative lengths never occur in a well-formed record;
//! decoding treats them as an unparseable tail.

use crate::error::{StorageError, StorageResult};

/// Size of the record header: key_len (4) + value_len (4).
pub const RECORD_HEADER_LEN: usize = 8;

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Length of the key in bytes.
    pub key_len: usize,
    /// Length of the value in bytes.
    pub value_len: usize,
}

impl RecordHeader {
    /// Decodes a header from its fixed-width encoding.
    ///
    /// Returns `None` if either length is negative, which can only be the
    /// remains of an interrupted write (or garbage); callers treat it the
    /// same as a record that runs past end of file.
    #[must_use]
    pub fn decode(bytes: [u8; RECORD_HEADER_LEN]) -> Option<Self> {
        let key_len = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let value_len = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        if key_len < 0 || value_len < 0 {
            return None;
        }

        Some(Self {
            key_len: key_len as usize,
            value_len: value_len as usize,
        })
    }

    /// Total encoded size of the record this header describes.
    #[must_use]
    pub fn record_len(&self) -> u64 {
        (RECORD_HEADER_LEN + self.key_len + self.value_len) as u64
    }
}

/// Encodes one record into a contiguous buffer.
///
/// # Errors
///
/// Returns [`StorageError::RecordTooLarge`] if the key or value does not
/// fit a signed 32-bit length prefix.
pub fn encode_record(key: &[u8], value: &[u8]) -> StorageResult<Vec<u8>> {
    let key_len =
        i32::try_from(key.len()).map_err(|_| StorageError::RecordTooLarge { len: key.len() })?;
    let value_len = i32::try_from(value.len())
        .map_err(|_| StorageError::RecordTooLarge { len: value.len() })?;

    let mut buf = Vec::with_capacity(RECORD_HEADER_LEN + key.len() + value.len());
    buf.extend_from_slice(&key_len.to_le_bytes());
    buf.extend_from_slice(&value_len.to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    Ok(buf)
}
