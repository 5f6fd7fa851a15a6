//! Log-structured backend
//!
//! Durable store built from a single append-only log plus an in-memory index
//! of value locations. Values stay on disk; only keys are held in memory.
//!
//! ## Responsibilities
//! - Append a checksummed record for every put
//! - Rebuild the key index by replaying the log on open
//! - Truncate torn or corrupt tails left by a crash
//! - Compact superseded records away
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ File Header: Magic "DBAL" (4) | Ver (2) │
//! ├─────────────────────────────────────────┤
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │Payload │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2 ...                            │
//! └─────────────────────────────────────────┘
//! Payload: KeyLen (4) | Key | Value    (CRC32 covers the payload)
//! ```

mod record;
mod recovery;
mod store;
mod writer;

pub use record::{LogRecord, ValuePointer};
pub use recovery::{LogRecovery, RecoveredEntry, RecoveryResult};
pub use store::LogBackend;
pub use writer::LogWriter;

/// Magic bytes identifying a DBArray log file
pub(crate) const FILE_MAGIC: &[u8; 4] = b"DBAL";

/// Current log format version
pub(crate) const FILE_VERSION: u16 = 1;

/// File header size: Magic (4) + Version (2) = 6 bytes
pub const FILE_HEADER_SIZE: u64 = 6;

/// Record header size: LSN (8) + CRC (4) + Len (4) = 16 bytes
pub const RECORD_HEADER_SIZE: usize = 16;

/// Name of the log file inside the data directory
pub(crate) const LOG_FILENAME: &str = "array.log";

/// Temporary name used while compacting
pub(crate) const COMPACT_FILENAME: &str = "array.log.compact";
