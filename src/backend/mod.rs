//! Backend Module
//!
//! The ordered byte-keyed store an array is persisted into.
//!
//! ## Responsibilities
//! - Point reads and writes of opaque byte values
//! - Ordered key enumeration by prefix
//! - Releasing all resources on close
//!
//! The array layer only ever talks to the [`Backend`] trait. Two
//! implementations ship with the crate:
//! - [`MemoryBackend`]: a `BTreeMap`, nothing survives the process
//! - [`LogBackend`]: durable append-only log under a data directory

mod log_store;
mod memory;

pub use log_store::{
    LogBackend, LogRecord, LogRecovery, LogWriter, RecoveredEntry, RecoveryResult, ValuePointer,
    FILE_HEADER_SIZE, RECORD_HEADER_SIZE,
};
pub use memory::MemoryBackend;

use crate::error::BackendError;

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// An ordered byte-keyed store with single-writer semantics
///
/// Keys compare lexicographically as byte strings. `put` takes `&mut self`,
/// so the owner of a backend is its only writer.
pub trait Backend {
    /// Value stored under `key`, if any
    fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()>;

    /// All keys starting with `prefix`, in ascending byte order
    fn keys_with_prefix(&self, prefix: &[u8]) -> BackendResult<Vec<Vec<u8>>>;

    /// Flush outstanding writes and release the store
    fn close(self) -> BackendResult<()>
    where
        Self: Sized;
}
