//! Error types for DBArray
//!
//! Two layers: [`BackendError`] for failures inside a key-value store, and
//! [`ArrayError`] for everything the array layer reports. Backend failures are
//! wrapped without being rewritten so callers can still match on them.

use thiserror::Error;

/// Result type alias using ArrayError
pub type Result<T> = std::result::Result<T, ArrayError>;

/// Errors raised by a [`Backend`](crate::backend::Backend) implementation
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log contents failed validation (bad magic, CRC mismatch, short read)
    #[error("Log corruption detected: {0}")]
    Corruption(String),

    /// A failed write left the log in a state no further append may build on
    #[error("Log writer is unusable: {0}")]
    Poisoned(String),

    /// The location exists but does not hold a store of this kind
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Unified error type for array operations
#[derive(Debug, Error)]
pub enum ArrayError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// Bad shape, dtype or attribute parameters
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Shape and dtype are finalized; {0} is no longer allowed")]
    AlreadyFinalized(&'static str),

    #[error("Array is not initialized: shape and dtype must be set first")]
    NotInitialized,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: u64 },

    #[error("Row {0} was never written")]
    RowNotFound(u64),

    #[error("Array is incomplete: row {missing} was never written")]
    IncompleteArray { missing: u64 },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    /// Size or format mismatch while encoding/decoding rows, descriptors or attributes
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<bincode::Error> for ArrayError {
    fn from(e: bincode::Error) -> Self {
        ArrayError::Codec(e.to_string())
    }
}
