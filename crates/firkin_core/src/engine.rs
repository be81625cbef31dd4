//! The key-value engine: put/get/compact, rollover, and startup recovery.

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use firkin_storage::{list_segment_files, segment_file_name, ReadOutcome, SegmentFile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Location of the most recent record for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    /// Sequence number of the segment holding the record.
    seq: u64,
    /// Byte offset of the record's start within that segment.
    offset: u64,
}

/// Statistics returned by [`Engine::compact`].
#[derive(Debug, Clone, Default)]
pub struct CompactionStats {
    /// Number of live records rewritten into the compacted segment.
    pub migrated_records: usize,
    /// Number of segment files deleted.
    pub segments_removed: usize,
    /// Total segment bytes on disk before compaction.
    pub bytes_before: u64,
    /// Segment bytes on disk after compaction.
    pub bytes_after: u64,
}

impl CompactionStats {
    /// Bytes reclaimed by the compaction.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// A log-structured key-value engine over one data directory.
///
/// Writes are appended to the single active segment; an in-memory index
/// maps each key to the location of its most recent value. On open, the
/// index is rebuilt by replaying every segment in creation order, so later
/// records for a key overwrite earlier entries (last-write-wins).
///
/// All three operations — `put`, `get`, `compact` — run under one mutex:
/// at most one executes at a time, so no reader ever observes a
/// half-updated index and compaction cannot race an in-flight put.
///
/// The data directory is assumed to be exclusively owned by this engine
/// instance; concurrent external processes are not detected.
///
/// # Example
///
/// ```rust,ignore
/// use firkin_core::{Config, Engine};
/// use std::path::Path;
///
/// let engine = Engine::open(Path::new("my_data"))?;
/// engine.put(b"greeting", b"hello")?;
/// assert_eq!(engine.get(b"greeting")?, Some(b"hello".to_vec()));
/// ```
pub struct Engine {
    inner: Mutex<EngineInner>,
}

struct EngineInner {
    /// Data directory holding the segment files.
    data_dir: PathBuf,
    /// Rollover threshold in bytes.
    max_segment_size: u64,
    /// Key -> location of its most recent record.
    index: HashMap<Vec<u8>, IndexEntry>,
    /// Immutable segments, in creation order. Retained for lookups until
    /// compaction retires them.
    sealed: Vec<SegmentFile>,
    /// The sole writable segment.
    active: SegmentFile,
    /// Sequence number for the next segment this engine creates.
    next_seq: u64,
}

impl Engine {
    /// Opens an engine over a data directory with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a segment
    /// file cannot be opened or replayed.
    pub fn open(dir: &Path) -> EngineResult<Self> {
        Self::open_with_config(dir, Config::default())
    }

    /// Opens an engine over a data directory, creating it if absent.
    ///
    /// Existing segment files are adopted: each is replayed into the index
    /// in creation order, all but the last are sealed, and the last becomes
    /// active. Replay stops at the first truncated record in a segment (the
    /// partial tail of an interrupted append); for the segment that becomes
    /// active, the tail is also cut off so new appends stay recoverable.
    ///
    /// If no segment files exist, a fresh empty active segment is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a segment
    /// file cannot be opened or replayed.
    pub fn open_with_config(dir: &Path, config: Config) -> EngineResult<Self> {
        fs::create_dir_all(dir)?;

        let metas = list_segment_files(dir)?;
        let mut index = HashMap::new();

        if metas.is_empty() {
            let active = SegmentFile::create(&dir.join(segment_file_name(0)), 0)?;
            info!(data_dir = %dir.display(), "initialized empty data directory");
            return Ok(Self {
                inner: Mutex::new(EngineInner {
                    data_dir: dir.to_path_buf(),
                    max_segment_size: config.max_segment_size,
                    index,
                    sealed: Vec::new(),
                    active,
                    next_seq: 1,
                }),
            });
        }

        let mut segments = Vec::with_capacity(metas.len());
        for meta in &metas {
            let mut segment = SegmentFile::open(&meta.path, meta.seq)?;
            replay(&mut segment, &mut index)?;
            segments.push(segment);
        }

        // The lexically-last segment continues as active. Cut off any
        // partial tail first: appending after unparseable bytes would make
        // the new records invisible to the next replay.
        let mut active = segments.pop().expect("at least one segment exists");
        let valid_end = replayable_end(&mut active)?;
        if valid_end < active.size() {
            warn!(
                seq = active.seq(),
                valid_end,
                size = active.size(),
                "discarding partial tail record from interrupted append"
            );
            active.truncate(valid_end)?;
        }

        let next_seq = active.seq() + 1;
        info!(
            data_dir = %dir.display(),
            segments = metas.len(),
            keys = index.len(),
            "recovered engine state"
        );

        Ok(Self {
            inner: Mutex::new(EngineInner {
                data_dir: dir.to_path_buf(),
                max_segment_size: config.max_segment_size,
                index,
                sealed: segments,
                active,
                next_seq,
            }),
        })
    }

    /// Writes a value for a key.
    ///
    /// The record is appended to the active segment and forced to stable
    /// storage before this returns. Overwriting a key does not reclaim the
    /// old record's space; that happens only via [`Engine::compact`]. If
    /// the append pushes the active segment to or past the configured size
    /// threshold, it is sealed and a fresh active segment is created.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if the key or value exceeds the
    /// 32-bit length prefix.
    pub fn put(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut inner = self.inner.lock();

        let offset = inner.active.append(key, value)?;
        let seq = inner.active.seq();
        inner.index.insert(key.to_vec(), IndexEntry { seq, offset });

        if inner.active.size() >= inner.max_segment_size {
            inner.roll()?;
        }

        Ok(())
    }

    /// Reads the current value for a key, or `None` if the key has never
    /// been written.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, or a corruption error if the index
    /// points at a location that does not hold a complete record (which
    /// cannot happen absent storage corruption).
    pub fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let mut inner = self.inner.lock();

        let Some(&IndexEntry { seq, offset }) = inner.index.get(key) else {
            return Ok(None);
        };

        Ok(Some(inner.read_value(seq, offset)?))
    }

    /// Rewrites the live value for every indexed key into one new segment
    /// and deletes all prior segments.
    ///
    /// The compacted segment takes the next in-line sequence number, so it
    /// is an ordinary segment for recovery ordering: if the process dies
    /// after the rewrite but before the old files are deleted, replay
    /// visits the old segments first and the compacted one last, and
    /// last-write-wins still yields the correct index. The file position
    /// of a given key within the compacted segment is unspecified.
    ///
    /// No-op (all-zero statistics) if the index is empty.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure. If deleting an old segment fails,
    /// the compacted segment is already active and the stale files remain
    /// on disk; there is no rollback. A retried compaction, or the next
    /// recovery, remains correct because the stale segments sort earlier.
    pub fn compact(&self) -> EngineResult<CompactionStats> {
        let mut inner = self.inner.lock();

        if inner.index.is_empty() {
            return Ok(CompactionStats::default());
        }

        let bytes_before =
            inner.sealed.iter().map(SegmentFile::size).sum::<u64>() + inner.active.size();

        let seq = inner.next_seq;
        let path = inner.data_dir.join(segment_file_name(seq));
        let mut compacted = SegmentFile::create(&path, seq)?;

        // Migrate each key's live value. The new index entries are applied
        // only once every value has been rewritten, and a failed migration
        // removes the partial output file: left behind, it would carry the
        // highest sequence number and shadow newer writes on the next
        // replay. No `get` can interleave with the migration either way;
        // the whole operation holds the engine lock.
        let migrated = match inner.migrate_live_records(&mut compacted, seq) {
            Ok(migrated) => migrated,
            Err(e) => {
                drop(compacted);
                let _ = fs::remove_file(&path);
                return Err(e);
            }
        };
        for (key, entry) in migrated {
            inner.index.insert(key, entry);
        }
        inner.next_seq = seq + 1;

        // Retire every previous segment. The compacted segment is promoted
        // first so a deletion failure leaves a queryable engine.
        let old_active = mem::replace(&mut inner.active, compacted);
        let mut retired: Vec<SegmentFile> = inner.sealed.drain(..).collect();
        retired.push(old_active);

        let stats = CompactionStats {
            migrated_records: inner.index.len(),
            segments_removed: retired.len(),
            bytes_before,
            bytes_after: inner.active.size(),
        };

        for segment in &retired {
            fs::remove_file(segment.path())?;
        }

        info!(
            migrated = stats.migrated_records,
            removed = stats.segments_removed,
            reclaimed = stats.bytes_reclaimed(),
            "compaction complete"
        );

        Ok(stats)
    }

    /// Number of distinct keys currently indexed.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.inner.lock().index.len()
    }

    /// Number of segment files the engine currently owns (sealed + active).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.sealed.len() + 1
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Engine")
            .field("data_dir", &inner.data_dir)
            .field("max_segment_size", &inner.max_segment_size)
            .field("keys", &inner.index.len())
            .field("segments", &(inner.sealed.len() + 1))
            .finish_non_exhaustive()
    }
}

impl EngineInner {
    /// Seals the active segment and creates a fresh one named by the next
    /// sequence number.
    fn roll(&mut self) -> EngineResult<()> {
        let seq = self.next_seq;
        let fresh = SegmentFile::create(&self.data_dir.join(segment_file_name(seq)), seq)?;
        let sealed = mem::replace(&mut self.active, fresh);

        debug!(
            sealed_seq = sealed.seq(),
            sealed_size = sealed.size(),
            new_seq = seq,
            "rolled active segment"
        );

        self.sealed.push(sealed);
        self.next_seq = seq + 1;
        Ok(())
    }

    /// Rewrites the live value of every indexed key into `compacted`,
    /// returning the index entries to apply once the whole migration has
    /// succeeded. The order across keys follows index iteration and is not
    /// semantically meaningful.
    fn migrate_live_records(
        &mut self,
        compacted: &mut SegmentFile,
        seq: u64,
    ) -> EngineResult<Vec<(Vec<u8>, IndexEntry)>> {
        let entries: Vec<(Vec<u8>, IndexEntry)> = self
            .index
            .iter()
            .map(|(key, &entry)| (key.clone(), entry))
            .collect();

        let mut migrated = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let value = self.read_value(entry.seq, entry.offset)?;
            let offset = compacted.append(&key, &value)?;
            migrated.push((key, IndexEntry { seq, offset }));
        }

        Ok(migrated)
    }

    /// Reads the value of the record at a trusted (segment, offset)
    /// location taken from the index.
    fn read_value(&mut self, seq: u64, offset: u64) -> EngineResult<Vec<u8>> {
        let segment = self.segment_mut(seq)?;
        match segment.read_at(offset)? {
            ReadOutcome::Record { value, .. } => Ok(value),
            ReadOutcome::Truncated => Err(EngineError::corruption(format!(
                "index points at incomplete record in segment {seq} at offset {offset}"
            ))),
        }
    }

    fn segment_mut(&mut self, seq: u64) -> EngineResult<&mut SegmentFile> {
        if self.active.seq() == seq {
            Ok(&mut self.active)
        } else {
            self.sealed
                .iter_mut()
                .find(|s| s.seq() == seq)
                .ok_or_else(|| {
                    EngineError::corruption(format!("index references unknown segment {seq}"))
                })
        }
    }
}

/// Replays a segment from offset 0, inserting every complete record into
/// the index. Later records for a key overwrite earlier entries, within a
/// segment and across segments. Stops at the first truncated record: the
/// remainder is a non-durable partial write from a prior crash.
fn replay(
    segment: &mut SegmentFile,
    index: &mut HashMap<Vec<u8>, IndexEntry>,
) -> EngineResult<()> {
    let seq = segment.seq();
    let mut offset = 0;

    while offset < segment.size() {
        match segment.read_at(offset)? {
            ReadOutcome::Record {
                key, next_offset, ..
            } => {
                index.insert(key, IndexEntry { seq, offset });
                offset = next_offset;
            }
            ReadOutcome::Truncated => break,
        }
    }

    Ok(())
}

/// Returns the offset one past the last complete record in the segment.
fn replayable_end(segment: &mut SegmentFile) -> EngineResult<u64> {
    let mut offset = 0;
    while offset < segment.size() {
        match segment.read_at(offset)? {
            ReadOutcome::Record { next_offset, .. } => offset = next_offset,
            ReadOutcome::Truncated => break,
        }
    }
    Ok(offset)
}
