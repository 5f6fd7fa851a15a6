//! Log Writer
//!
//! Handles appending records to the log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backend::BackendResult;
use crate::config::SyncStrategy;
use crate::error::BackendError;

use super::record::{file_header, LogRecord};
use super::ValuePointer;

/// Appends records to the log file
pub struct LogWriter {
    file: File,
    path: PathBuf,
    /// LSN assigned to the next appended record
    next_lsn: u64,
    /// End-of-file offset (where the next record starts)
    position: u64,
    sync_strategy: SyncStrategy,
    /// Records written since the last fsync
    unsynced: usize,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl LogWriter {
    /// Create a new log holding only the file header, replacing any file at `path`
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> BackendResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let header = file_header();
        file.write_all(&header)?;
        file.sync_all()?;
        drop(file);

        Self::open(path, sync_strategy, 1)
    }

    /// Open an existing, already validated log for appending
    ///
    /// `next_lsn` comes from recovery (last valid LSN + 1).
    pub fn open(path: &Path, sync_strategy: SyncStrategy, next_lsn: u64) -> BackendResult<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        let position = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            next_lsn,
            position,
            sync_strategy,
            unsynced: 0,
            poisoned: false,
        })
    }

    /// Append a put record, returning its LSN and where its value landed
    ///
    /// A failed write is cut back to the previous end of log so later
    /// records start where `position` says. If that cut fails too, the
    /// writer refuses every further append.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> BackendResult<(u64, ValuePointer)> {
        if self.poisoned {
            return Err(BackendError::Poisoned(format!(
                "{} has a torn record at offset {}",
                self.path.display(),
                self.position
            )));
        }

        let record = LogRecord::new(self.next_lsn, key.to_vec(), value.to_vec());
        let bytes = record.serialize()?;

        if let Err(e) = self.file.write_all(&bytes) {
            self.rollback();
            return Err(e.into());
        }

        let pointer = record.value_pointer(self.position);
        self.position += bytes.len() as u64;
        self.next_lsn += 1;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok((record.lsn, pointer))
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> BackendResult<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN of the most recently appended record (0 if none)
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn - 1
    }

    /// Current end-of-log offset
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a failed append left bytes that could not be removed
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.position) {
            tracing::warn!(
                "Failed to truncate {} back to {} bytes: {}",
                self.path.display(),
                self.position,
                e
            );
            self.poisoned = true;
        }
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if self.unsynced > 0 {
            if let Err(e) = self.file.sync_data() {
                tracing::warn!("Failed to sync {} on drop: {}", self.path.display(), e);
            }
        }
    }
}
