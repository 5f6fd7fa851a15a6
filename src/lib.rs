//! # DBArray
//!
//! Two-dimensional numeric arrays stored row by row in an ordered key-value
//! store, so arrays larger than memory can be written and read back one row
//! at a time and materialized only on demand.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ArrayHandle                           │
//! │        (state machine, row get/set, dense import/export)     │
//! └───────┬─────────────────┬───────────────────┬───────────────┘
//!         │                 │                   │
//!         ▼                 ▼                   ▼
//!  ┌─────────────┐   ┌─────────────┐    ┌─────────────┐
//!  │  Metadata   │   │  KeyScheme  │    │  RowCodec   │
//!  │ shape/dtype │   │ index → key │    │ row ↔ bytes │
//!  └──────┬──────┘   └──────┬──────┘    └──────┬──────┘
//!         │                 │                  │
//!         └─────────────────┼──────────────────┘
//!                           ▼
//!                   ┌─────────────┐
//!                   │   Backend   │
//!                   │ (Log / Mem) │
//!                   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dbarray::DType;
//!
//! # fn main() -> dbarray::Result<()> {
//! let mut array = dbarray::open("/tmp/features")?;
//! array.set_shape(2, 3)?;
//! array.set_dtype("float32".parse::<DType>()?)?;
//! array.set_row(0, &[1.0f32, 2.0, 3.0])?;
//! array.set_row(1, &[4.0f32, 5.0, 6.0])?;
//!
//! let dense = array.to_dense::<f32>()?;
//! assert_eq!(dense[[1, 2]], 6.0);
//! array.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod dtype;
pub mod codec;
pub mod keys;
pub mod metadata;
pub mod attrs;
pub mod backend;
pub mod array;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArrayError, BackendError, Result};
pub use config::{Config, SyncStrategy};
pub use dtype::{ByteOrder, DType, Element, Kind};
pub use metadata::{MetadataRecord, Shape};
pub use attrs::AttrValue;
pub use backend::{Backend, LogBackend, MemoryBackend};
pub use array::{ArrayHandle, Rows, State};

use std::path::Path;

use ndarray::{ArrayBase, Data, Ix2};

/// Open or create an array stored in the directory `location`
pub fn open(location: impl AsRef<Path>) -> Result<ArrayHandle> {
    ArrayHandle::open(location)
}

/// Persist `matrix` into a new array at `location`
pub fn from_dense<S, T>(matrix: &ArrayBase<S, Ix2>, location: impl AsRef<Path>) -> Result<ArrayHandle>
where
    S: Data<Elem = T>,
    T: Element,
{
    ArrayHandle::from_dense(matrix, location)
}

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DBArray
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
