//! # Firkin Storage
//!
//! Segment file layer for firkin.
//!
//! A segment is an append-only file of framed key/value records:
//!
//! ```text
//! | key_len (i32 LE) | value_len (i32 LE) | key bytes | value bytes | ...
//! ```
//!
//! There is no header, footer, or checksum. Records are never updated or
//! deleted in place; a new value for a key is always a new record at the
//! tail. A record whose declared lengths run past the physical end of the
//! file is *truncated* — the leftover of an interrupted write, reported as
//! a sentinel rather than an error so replay can stop cleanly.
//!
//! Segments know nothing about keys' semantic meaning or about other
//! segments. The engine in `firkin_core` owns segment lifecycle and is the
//! only caller of this crate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod name;
mod record;
mod segment;

pub use error::{StorageError, StorageResult};
pub use name::{list_segment_files, parse_segment_seq, segment_file_name, SegmentMeta};
pub use record::{encode_record, RecordHeader, RECORD_HEADER_LEN};
pub use segment::{ReadOutcome, SegmentFile};
