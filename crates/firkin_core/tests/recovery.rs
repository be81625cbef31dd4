//! Recovery tests: reopening a data directory must reproduce identical
//! `get` results for every key, for any interleaving of puts, rollovers,
//! and at most one compaction performed beforehand.

use firkin_core::{Config, Engine};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

fn open(dir: &Path, max_segment_size: u64) -> Engine {
    Engine::open_with_config(dir, Config::new().max_segment_size(max_segment_size)).unwrap()
}

fn segment_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("segment-"))
        })
        .collect();
    paths.sort();
    paths
}

#[test]
fn reopen_reproduces_all_values() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = open(dir.path(), 64);
        for i in 0..30u32 {
            let key = format!("key-{i}");
            let value = format!("value-{i}");
            engine.put(key.as_bytes(), value.as_bytes()).unwrap();
        }
        engine.put(b"key-7", b"rewritten").unwrap();
    }

    let engine = open(dir.path(), 64);
    assert_eq!(engine.get(b"key-7").unwrap(), Some(b"rewritten".to_vec()));
    for i in 0..30u32 {
        if i == 7 {
            continue;
        }
        let key = format!("key-{i}");
        let value = format!("value-{i}");
        assert_eq!(
            engine.get(key.as_bytes()).unwrap(),
            Some(value.into_bytes())
        );
    }
}

#[test]
fn reopen_after_compaction() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = open(dir.path(), 64);
        for i in 0..20u32 {
            let key = format!("key-{i}");
            engine.put(key.as_bytes(), b"0123456789abcdef").unwrap();
        }
        engine.compact().unwrap();
        // Writes after compaction land in the compacted (now active) segment.
        engine.put(b"after", b"compaction").unwrap();
    }

    let engine = open(dir.path(), 64);
    assert_eq!(engine.get(b"after").unwrap(), Some(b"compaction".to_vec()));
    for i in 0..20u32 {
        let key = format!("key-{i}");
        assert_eq!(
            engine.get(key.as_bytes()).unwrap(),
            Some(b"0123456789abcdef".to_vec())
        );
    }
}

#[test]
fn reopen_continues_sequence_numbering() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = open(dir.path(), 32);
        for i in 0..8u32 {
            engine.put(format!("k{i}").as_bytes(), b"0123456789").unwrap();
        }
    }
    let before = segment_files(dir.path()).len();
    assert!(before > 1);

    // Reopening and writing more must never reuse an existing file name.
    {
        let engine = open(dir.path(), 32);
        for i in 8..16u32 {
            engine.put(format!("k{i}").as_bytes(), b"0123456789").unwrap();
        }
    }

    let engine = open(dir.path(), 32);
    for i in 0..16u32 {
        assert_eq!(
            engine.get(format!("k{i}").as_bytes()).unwrap(),
            Some(b"0123456789".to_vec())
        );
    }
}

#[test]
fn truncated_tail_loses_only_the_partial_record() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = open(dir.path(), 4096);
        engine.put(b"complete", b"record").unwrap();
    }

    // Simulate an append interrupted mid-write: a header that declares more
    // bytes than ever reached the disk.
    let active = segment_files(dir.path()).pop().unwrap();
    let mut file = OpenOptions::new().append(true).open(&active).unwrap();
    file.write_all(&100i32.to_le_bytes()).unwrap();
    file.write_all(&100i32.to_le_bytes()).unwrap();
    file.write_all(b"only a few bytes").unwrap();
    drop(file);

    let engine = open(dir.path(), 4096);
    assert_eq!(engine.get(b"complete").unwrap(), Some(b"record".to_vec()));
    assert_eq!(engine.key_count(), 1);

    // The tail was cut off, so records written after recovery are visible
    // to the *next* recovery too.
    engine.put(b"fresh", b"write").unwrap();
    drop(engine);

    let engine = open(dir.path(), 4096);
    assert_eq!(engine.get(b"complete").unwrap(), Some(b"record".to_vec()));
    assert_eq!(engine.get(b"fresh").unwrap(), Some(b"write".to_vec()));
}

#[test]
fn crashed_compaction_replays_in_correct_order() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = open(dir.path(), 64);
        for i in 0..10u32 {
            engine
                .put(format!("k{i}").as_bytes(), b"0123456789abcdef")
                .unwrap();
        }
        engine.put(b"k3", b"latest").unwrap();
        engine.compact().unwrap();
    }

    // Simulate a crash after the compacted segment was written but before
    // the old segments were deleted: put a stale, lower-numbered segment
    // back. It must replay before the compacted segment, so the compacted
    // (latest) values win.
    let stale = dir.path().join("segment-0000000000.log");
    let mut file = fs::File::create(&stale).unwrap();
    let mut record = Vec::new();
    record.extend_from_slice(&2i32.to_le_bytes());
    record.extend_from_slice(&5i32.to_le_bytes());
    record.extend_from_slice(b"k3");
    record.extend_from_slice(b"stale");
    file.write_all(&record).unwrap();
    file.sync_all().unwrap();
    drop(file);

    let engine = open(dir.path(), 64);
    assert_eq!(engine.get(b"k3").unwrap(), Some(b"latest".to_vec()));
}

#[test]
fn reopen_of_empty_engine_is_stable() {
    let dir = tempfile::tempdir().unwrap();

    {
        let _engine = open(dir.path(), 4096);
    }
    let engine = open(dir.path(), 4096);

    assert_eq!(engine.get(b"anything").unwrap(), None);
    assert_eq!(segment_files(dir.path()).len(), 1);
}
