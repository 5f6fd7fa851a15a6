//! Log-backed store
//!
//! Ties the writer, the recovered index and a read handle together.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::backend::{Backend, BackendResult};
use crate::config::{Config, SyncStrategy};
use crate::error::BackendError;

use super::recovery::LogRecovery;
use super::writer::LogWriter;
use super::{ValuePointer, COMPACT_FILENAME, LOG_FILENAME};

/// Durable single-writer store over an append-only log
///
/// ## Concurrency:
/// - Writes: `&mut self`, so only the owner appends
/// - Reads: `&self`; the read handle's seek position is behind a `Mutex`
pub struct LogBackend {
    data_dir: PathBuf,

    sync_strategy: SyncStrategy,

    compact_on_close: bool,

    writer: LogWriter,

    /// Separate read handle (the writer is opened in append mode)
    reader: Mutex<File>,

    /// key → location of the latest value
    index: BTreeMap<Vec<u8>, ValuePointer>,

    /// Records shadowed by a later put of the same key
    superseded: u64,
}

impl LogBackend {
    /// Open or create a store in `config.data_dir`
    ///
    /// On startup:
    /// 1. Create the data directory if allowed
    /// 2. Recover the log (truncating a torn tail) or create a fresh one
    /// 3. Rebuild the key index from the recovered records
    pub fn open(config: &Config) -> BackendResult<Self> {
        let data_dir = config.data_dir.clone();

        // Step 1: Data directory
        if !data_dir.exists() {
            if !config.create_if_missing {
                return Err(BackendError::InvalidLocation(format!(
                    "{} does not exist",
                    data_dir.display()
                )));
            }
            fs::create_dir_all(&data_dir)?;
        } else if !data_dir.is_dir() {
            return Err(BackendError::InvalidLocation(format!(
                "{} is not a directory",
                data_dir.display()
            )));
        }

        let log_path = data_dir.join(LOG_FILENAME);

        // Step 2: Recover or create the log
        let (writer, index, superseded) = if log_path.exists() {
            let (entries, result) = LogRecovery::recover(&log_path)?;

            tracing::debug!(
                "Recovered {}: {} records, last_lsn={}, truncated={}",
                log_path.display(),
                result.entries_recovered,
                result.last_lsn,
                result.was_truncated
            );

            // Step 3: Replay into the index, later records win
            let mut index = BTreeMap::new();
            let mut superseded = 0;
            for entry in entries {
                if index.insert(entry.key, entry.pointer).is_some() {
                    superseded += 1;
                }
            }

            let writer = LogWriter::open(&log_path, config.sync_strategy, result.last_lsn + 1)?;
            (writer, index, superseded)
        } else {
            let writer = LogWriter::create(&log_path, config.sync_strategy)?;
            (writer, BTreeMap::new(), 0)
        };

        let reader = File::open(&log_path)?;

        Ok(Self {
            data_dir,
            sync_strategy: config.sync_strategy,
            compact_on_close: config.compact_on_close,
            writer,
            reader: Mutex::new(reader),
            index,
            superseded,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> BackendResult<Self> {
        Self::open(&Config::at(path))
    }

    /// True if `path` is a directory holding a log written by this backend
    pub fn is_valid(path: &Path) -> bool {
        LogRecovery::has_valid_header(&path.join(LOG_FILENAME))
    }

    /// Rewrite the log keeping only the latest record of each key
    ///
    /// Writes a fresh log beside the current one and renames it into place,
    /// so a crash mid-compaction leaves the old log intact.
    pub fn compact(&mut self) -> BackendResult<()> {
        let log_path = self.data_dir.join(LOG_FILENAME);
        let compact_path = self.data_dir.join(COMPACT_FILENAME);

        let before = self.writer.position();
        let mut compacted = LogWriter::create(&compact_path, SyncStrategy::EveryNEntries {
            count: usize::MAX,
        })?;

        let mut index = BTreeMap::new();
        for (key, pointer) in &self.index {
            let value = self.read_value(*pointer)?;
            let (_, new_pointer) = compacted.append(key, &value)?;
            index.insert(key.clone(), new_pointer);
        }
        compacted.sync()?;
        let next_lsn = compacted.current_lsn() + 1;
        drop(compacted);

        fs::rename(&compact_path, &log_path)?;
        sync_dir(&self.data_dir)?;

        self.writer = LogWriter::open(&log_path, self.sync_strategy, next_lsn)?;
        *self.reader.lock() = File::open(&log_path)?;
        self.index = index;
        self.superseded = 0;

        tracing::info!(
            "Compacted {}: {} -> {} bytes, {} live keys",
            log_path.display(),
            before,
            self.writer.position(),
            self.index.len()
        );

        Ok(())
    }

    /// Force sync of the log to disk
    pub fn sync(&mut self) -> BackendResult<()> {
        self.writer.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the log file
    pub fn log_path(&self) -> &Path {
        self.writer.path()
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Number of records shadowed by later writes
    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }

    /// Current log size in bytes
    pub fn log_size(&self) -> u64 {
        self.writer.position()
    }

    /// LSN of the last record written
    pub fn last_lsn(&self) -> u64 {
        self.writer.current_lsn()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_value(&self, pointer: ValuePointer) -> BackendResult<Vec<u8>> {
        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(pointer.offset))?;

        let mut value = vec![0u8; pointer.len as usize];
        reader.read_exact(&mut value).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                BackendError::Corruption(format!(
                    "Value at offset {} ({} bytes) extends past end of log",
                    pointer.offset, pointer.len
                ))
            } else {
                BackendError::Io(e)
            }
        })?;

        Ok(value)
    }
}

impl Backend for LogBackend {
    fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>> {
        match self.index.get(key) {
            Some(pointer) => self.read_value(*pointer).map(Some),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()> {
        let (_, pointer) = self.writer.append(key, value)?;
        if self.index.insert(key.to_vec(), pointer).is_some() {
            self.superseded += 1;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> BackendResult<Vec<Vec<u8>>> {
        Ok(self
            .index
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    /// Close the store gracefully
    ///
    /// Compacts if enabled and anything was superseded, then syncs.
    fn close(mut self) -> BackendResult<()> {
        if self.compact_on_close && self.superseded > 0 {
            self.compact()?;
        }

        self.writer.sync()?;

        tracing::debug!(
            "Closed {} ({} keys, {} bytes)",
            self.data_dir.display(),
            self.index.len(),
            self.writer.position()
        );
        Ok(())
    }
}

/// Persist directory entries (the compaction rename) to disk
#[cfg(unix)]
fn sync_dir(dir: &Path) -> BackendResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> BackendResult<()> {
    Ok(())
}
