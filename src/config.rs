//! Configuration for DBArray
//!
//! Settings for the durable log backend. Arrays on an in-memory backend need
//! none of this.

use std::path::PathBuf;

/// Configuration for opening an array on a [`LogBackend`](crate::backend::LogBackend)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the array's files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── array.log          (append-only record log)
    ///     └── array.log.compact  (only while a compaction runs)
    pub data_dir: PathBuf,

    /// Create `data_dir` when it does not exist yet
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    /// Rewrite the log without superseded records when closing
    pub compact_on_close: bool,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced records (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./dbarray_data"),
            create_if_missing: true,
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            compact_on_close: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config rooted at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::builder().data_dir(path).build()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Fail instead of creating a missing data directory
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable or disable compaction on close
    pub fn compact_on_close(mut self, compact: bool) -> Self {
        self.config.compact_on_close = compact;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
