//! Tests for LogBackend
//!
//! These tests verify:
//! - Directory and log creation
//! - Put/get, overwrite, prefix scans
//! - Durability across close/reopen
//! - Compaction of superseded records
//! - Location validation

use std::fs;

use dbarray::backend::{Backend, LogBackend};
use dbarray::config::{Config, SyncStrategy};
use dbarray::BackendError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path().join("store"))
        .sync_strategy(SyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn setup_temp_backend() -> (TempDir, LogBackend) {
    let temp_dir = TempDir::new().unwrap();
    let backend = LogBackend::open(&test_config(&temp_dir)).unwrap();
    (temp_dir, backend)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let backend = LogBackend::open(&config).unwrap();

    assert!(config.data_dir.is_dir());
    assert!(backend.log_path().exists());
    assert_eq!(backend.key_count(), 0);
    assert_eq!(backend.last_lsn(), 0);
    assert!(LogBackend::is_valid(&config.data_dir));
}

#[test]
fn test_put_get() {
    let (_temp, mut backend) = setup_temp_backend();

    backend.put(b"hello", b"world").unwrap();

    assert_eq!(backend.get(b"hello").unwrap(), Some(b"world".to_vec()));
    assert_eq!(backend.get(b"nonexistent").unwrap(), None);
    assert_eq!(backend.last_lsn(), 1);
}

#[test]
fn test_put_empty_value() {
    let (_temp, mut backend) = setup_temp_backend();

    backend.put(b"empty", b"").unwrap();

    assert_eq!(backend.get(b"empty").unwrap(), Some(Vec::new()));
}

#[test]
fn test_put_overwrite_counts_superseded() {
    let (_temp, mut backend) = setup_temp_backend();

    backend.put(b"key", b"value1").unwrap();
    backend.put(b"key", b"value2").unwrap();
    backend.put(b"other", b"x").unwrap();

    assert_eq!(backend.get(b"key").unwrap(), Some(b"value2".to_vec()));
    assert_eq!(backend.key_count(), 2);
    assert_eq!(backend.superseded_count(), 1);
}

#[test]
fn test_keys_with_prefix_sorted() {
    let (_temp, mut backend) = setup_temp_backend();

    for key in [&b"\x01\x00\x0a"[..], b"\x01\x00\x02", b"\x02name", b"\x00shape"] {
        backend.put(key, b"v").unwrap();
    }

    let keys = backend.keys_with_prefix(&[0x01]).unwrap();
    assert_eq!(keys, vec![b"\x01\x00\x02".to_vec(), b"\x01\x00\x0a".to_vec()]);
}

// =============================================================================
// Durability Tests
// =============================================================================

#[test]
fn test_reopen_preserves_data() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let mut backend = LogBackend::open(&config).unwrap();
        for i in 0..50u32 {
            backend
                .put(format!("key{:03}", i).as_bytes(), &i.to_le_bytes())
                .unwrap();
        }
        backend.close().unwrap();
    }

    let backend = LogBackend::open(&config).unwrap();
    assert_eq!(backend.key_count(), 50);
    assert_eq!(backend.last_lsn(), 50);
    for i in 0..50u32 {
        let value = backend.get(format!("key{:03}", i).as_bytes()).unwrap();
        assert_eq!(value, Some(i.to_le_bytes().to_vec()));
    }
}

#[test]
fn test_reopen_without_close() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("store"))
        .sync_strategy(SyncStrategy::EveryNEntries { count: 1000 })
        .build();

    {
        let mut backend = LogBackend::open(&config).unwrap();
        backend.put(b"a", b"1").unwrap();
        backend.put(b"b", b"2").unwrap();
        // Dropped without close
    }

    let backend = LogBackend::open(&config).unwrap();
    assert_eq!(backend.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(backend.get(b"b").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_lsn_continues_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let mut backend = LogBackend::open(&config).unwrap();
        backend.put(b"a", b"1").unwrap();
        backend.put(b"b", b"2").unwrap();
        backend.close().unwrap();
    }

    let mut backend = LogBackend::open(&config).unwrap();
    backend.put(b"c", b"3").unwrap();
    assert_eq!(backend.last_lsn(), 3);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_drops_superseded_records() {
    let (_temp, mut backend) = setup_temp_backend();

    for round in 0..10u8 {
        backend.put(b"row", &[round; 64]).unwrap();
    }
    backend.put(b"other", b"keep").unwrap();
    let before = backend.log_size();

    backend.compact().unwrap();

    assert!(backend.log_size() < before);
    assert_eq!(backend.superseded_count(), 0);
    assert_eq!(backend.get(b"row").unwrap(), Some(vec![9u8; 64]));
    assert_eq!(backend.get(b"other").unwrap(), Some(b"keep".to_vec()));

    // Writes after compaction land in the new log
    backend.put(b"after", b"compaction").unwrap();
    assert_eq!(backend.get(b"after").unwrap(), Some(b"compaction".to_vec()));
}

#[test]
fn test_compacted_log_replaces_original_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let mut backend = LogBackend::open(&config).unwrap();
    backend.put(b"row", b"old").unwrap();
    backend.put(b"row", b"new").unwrap();
    backend.compact().unwrap();
    let compacted_size = backend.log_size();
    drop(backend);

    let entries: Vec<_> = fs::read_dir(temp_dir.path().join("store"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("array.log")]);

    let backend = LogBackend::open(&config).unwrap();
    assert_eq!(backend.log_size(), compacted_size);
    assert_eq!(backend.superseded_count(), 0);
    assert_eq!(backend.get(b"row").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn test_close_compacts_when_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let log_path = {
        let mut backend = LogBackend::open(&config).unwrap();
        for round in 0..5u8 {
            backend.put(b"row", &[round; 128]).unwrap();
        }
        let path = backend.log_path().to_path_buf();
        backend.close().unwrap();
        path
    };

    let size = fs::metadata(&log_path).unwrap().len();
    // Header + one record: 16 header + 4 key_len + 3 key + 128 value
    assert_eq!(size, 6 + 16 + 4 + 3 + 128);

    let backend = LogBackend::open(&config).unwrap();
    assert_eq!(backend.get(b"row").unwrap(), Some(vec![4u8; 128]));
    assert!(!config.data_dir.join("array.log.compact").exists());
}

#[test]
fn test_close_keeps_history_when_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("store"))
        .compact_on_close(false)
        .build();

    {
        let mut backend = LogBackend::open(&config).unwrap();
        backend.put(b"row", b"1").unwrap();
        backend.put(b"row", b"2").unwrap();
        backend.close().unwrap();
    }

    let backend = LogBackend::open(&config).unwrap();
    assert_eq!(backend.superseded_count(), 1);
    assert_eq!(backend.get(b"row").unwrap(), Some(b"2".to_vec()));
}

// =============================================================================
// Location Validation Tests
// =============================================================================

#[test]
fn test_missing_directory_without_create() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("absent"))
        .create_if_missing(false)
        .build();

    let result = LogBackend::open(&config);
    assert!(matches!(result, Err(BackendError::InvalidLocation(_))));
}

#[test]
fn test_location_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plain_file");
    fs::write(&path, b"not a directory").unwrap();

    let result = LogBackend::open_path(&path);
    assert!(matches!(result, Err(BackendError::InvalidLocation(_))));
}

#[test]
fn test_foreign_log_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("store");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("array.log"), b"SQLite format 3\0").unwrap();

    assert!(!LogBackend::is_valid(&dir));
    let result = LogBackend::open_path(&dir);
    assert!(matches!(result, Err(BackendError::InvalidLocation(_))));
}

#[test]
fn test_is_valid_on_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(!LogBackend::is_valid(temp_dir.path()));
}
