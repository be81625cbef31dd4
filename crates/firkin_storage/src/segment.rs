//! Segment files.
//!
//! A [`SegmentFile`] is a thin wrapper over one append-only file of framed
//! records. It owns the open file handle and a cached size so the engine's
//! rollover check never touches the filesystem.
//!
//! # Durability
//!
//! `append` calls `sync_data` before returning: a returned offset is
//! guaranteed to survive a process restart absent media failure. There is
//! no buffering between the caller and the file.

use crate::error::StorageResult;
use crate::record::{encode_record, RecordHeader, RECORD_HEADER_LEN};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Result of decoding the record at a given offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete record starting at the requested offset.
    Record {
        /// The record's key bytes.
        key: Vec<u8>,
        /// The record's value bytes.
        value: Vec<u8>,
        /// Offset of the byte immediately after this record.
        next_offset: u64,
    },
    /// The record's header or declared body extends past the end of the
    /// file: the leftover of an interrupted append. Not an error — replay
    /// uses this to stop scanning cleanly.
    Truncated,
}

/// An append-only file of framed key/value records.
///
/// The segment has no knowledge of other segments or of which record is
/// the most recent for a key; that is the engine's business.
#[derive(Debug)]
pub struct SegmentFile {
    seq: u64,
    path: PathBuf,
    file: File,
    size: u64,
}

impl SegmentFile {
    /// Creates a new, empty, writable segment, truncating any pre-existing
    /// file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened for read/write.
    pub fn create(path: &Path, seq: u64) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            seq,
            path: path.to_path_buf(),
            file,
            size: 0,
        })
    }

    /// Attaches to an existing segment file for continued read/write,
    /// without truncation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open(path: &Path, seq: u64) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            seq,
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Appends one record at the end of the file and forces it to stable
    /// storage. Returns the byte offset at which the record begins.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value exceeds the 32-bit length
    /// prefix, or on any I/O failure.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> StorageResult<u64> {
        let buf = encode_record(key, value)?;

        let offset = self.size;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        self.file.sync_data()?;
        self.size += buf.len() as u64;

        Ok(offset)
    }

    /// Decodes the record starting at `offset`.
    ///
    /// The offset must be the start of a record (it comes from the engine's
    /// index or from a sequential scan, never from user input). Yields
    /// [`ReadOutcome::Truncated`] if the header or the declared body runs
    /// past the end of the file.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn read_at(&mut self, offset: u64) -> StorageResult<ReadOutcome> {
        if offset + RECORD_HEADER_LEN as u64 > self.size {
            return Ok(ReadOutcome::Truncated);
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut header_bytes = [0u8; RECORD_HEADER_LEN];
        self.file.read_exact(&mut header_bytes)?;

        let Some(header) = RecordHeader::decode(header_bytes) else {
            return Ok(ReadOutcome::Truncated);
        };

        let next_offset = offset + header.record_len();
        if next_offset > self.size {
            return Ok(ReadOutcome::Truncated);
        }

        let mut key = vec![0u8; header.key_len];
        self.file.read_exact(&mut key)?;
        let mut value = vec![0u8; header.value_len];
        self.file.read_exact(&mut value)?;

        Ok(ReadOutcome::Record {
            key,
            value,
            next_offset,
        })
    }

    /// Cuts the file back to `len` bytes.
    ///
    /// Recovery uses this to discard a partial tail record before the
    /// segment accepts new appends; appending after unparseable tail bytes
    /// would leave the new records unreachable by the next replay.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn truncate(&mut self, len: u64) -> StorageResult<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.size = len;
        Ok(())
    }

    /// Current length of the file in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Creation sequence number of this segment.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Path to the segment file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
