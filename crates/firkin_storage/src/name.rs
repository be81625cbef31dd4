//! Segment file naming and directory listing.
//!
//! Segments are named `segment-<seq>.log` with the creation sequence number
//! zero-padded to 10 decimal digits, so lexical order equals numeric order.
//! Listing sorts by the parsed number anyway; the padding exists so that
//! anything else looking at the directory (shells, backup tooling) sees the
//! same order the engine does.

use crate::error::StorageResult;
use std::fs;
use std::path::{Path, PathBuf};

const SEGMENT_PREFIX: &str = "segment-";
const SEGMENT_SUFFIX: &str = ".log";

/// A segment file discovered in a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    /// Creation sequence number parsed from the file name.
    pub seq: u64,
    /// Path to the segment file.
    pub path: PathBuf,
}

/// Formats the file name for the segment with the given sequence number.
#[must_use]
pub fn segment_file_name(seq: u64) -> String {
    format!("{SEGMENT_PREFIX}{seq:010}{SEGMENT_SUFFIX}")
}

/// Parses a segment sequence number from a file name.
///
/// Returns `None` for anything that is not a well-formed segment name, so
/// unrelated files in the data directory are simply ignored.
#[must_use]
pub fn parse_segment_seq(name: &str) -> Option<u64> {
    let seq = name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?;
    seq.parse().ok()
}

/// Lists all segment files in `dir`, sorted by sequence number.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_segment_files(dir: &Path) -> StorageResult<Vec<SegmentMeta>> {
    let mut segments: Vec<SegmentMeta> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let seq = parse_segment_seq(path.file_name()?.to_str()?)?;
            Some(SegmentMeta { seq, path })
        })
        .collect();

    segments.sort_by_key(|s| s.seq);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn name_round_trip() {
        let name = segment_file_name(42);
        assert_eq!(name, "segment-0000000042.log");
        assert_eq!(parse_segment_seq(&name), Some(42));
    }

    #[test]
    fn padded_names_sort_numerically() {
        // The classic hazard: "segment-10" sorts before "segment-2" under
        // naive string comparison. Padding makes the orders agree.
        let two = segment_file_name(2);
        let ten = segment_file_name(10);
        assert!(two < ten);
    }

    #[test]
    fn rejects_foreign_names() {
        assert_eq!(parse_segment_seq("segment-abc.log"), None);
        assert_eq!(parse_segment_seq("segment-compacted.log"), None);
        assert_eq!(parse_segment_seq("wal-0000000001.log"), None);
        assert_eq!(parse_segment_seq("segment-0000000001"), None);
        assert_eq!(parse_segment_seq("MANIFEST"), None);
    }

    #[test]
    fn listing_sorts_and_filters() {
        let dir = tempdir().unwrap();
        for seq in [10u64, 0, 2] {
            std::fs::write(dir.path().join(segment_file_name(seq)), b"").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let segments = list_segment_files(dir.path()).unwrap();
        let seqs: Vec<u64> = segments.iter().map(|s| s.seq).collect();
        assert_eq!(seqs, vec![0, 2, 10]);
    }

    #[test]
    fn listing_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(list_segment_files(dir.path()).unwrap().is_empty());
    }
}
