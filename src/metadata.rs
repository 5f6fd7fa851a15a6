//! Array metadata
//!
//! Shape and dtype of an array, their persisted form, and the finalization
//! rule that freezes them once row data exists.
//!
//! ## Persisted Values
//! ```text
//! shape key → nrows: u64 LE (8) | ncols: u64 LE (8)
//! dtype key → 4-byte dtype descriptor
//! ```

use crate::backend::Backend;
use crate::dtype::DType;
use crate::error::{ArrayError, Result};
use crate::keys;

/// Encoded shape size: two fixed-width u64 values
pub const SHAPE_SIZE: usize = 16;

/// Number of rows and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub nrows: u64,
    pub ncols: u64,
}

impl Shape {
    /// Validate and build a shape; both dimensions must be positive
    pub fn new(nrows: i64, ncols: i64) -> Result<Self> {
        if nrows <= 0 || ncols <= 0 {
            return Err(ArrayError::Validation(format!(
                "Shape must be positive, got ({}, {})",
                nrows, ncols
            )));
        }

        Ok(Self {
            nrows: nrows as u64,
            ncols: ncols as u64,
        })
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(self.nrows, self.ncols))?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SHAPE_SIZE {
            return Err(ArrayError::Codec(format!(
                "Shape must be {} bytes, got {}",
                SHAPE_SIZE,
                bytes.len()
            )));
        }

        let (nrows, ncols): (u64, u64) = bincode::deserialize(bytes)?;
        if nrows == 0 || ncols == 0 || nrows > i64::MAX as u64 || ncols > i64::MAX as u64 {
            return Err(ArrayError::Codec(format!(
                "Stored shape is invalid: ({}, {})",
                nrows, ncols
            )));
        }

        Ok(Self { nrows, ncols })
    }
}

/// Shape and dtype as persisted together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataRecord {
    pub shape: Shape,
    pub dtype: DType,
}

/// In-memory metadata state with finalization
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    shape: Option<Shape>,
    dtype: Option<DType>,
    finalized: bool,
}

impl MetadataStore {
    /// Empty, unfinalized metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata loaded from a backend; starts finalized
    pub fn from_record(record: MetadataRecord) -> Self {
        Self {
            shape: Some(record.shape),
            dtype: Some(record.dtype),
            finalized: true,
        }
    }

    pub fn set_shape(&mut self, nrows: i64, ncols: i64) -> Result<()> {
        if self.finalized {
            return Err(ArrayError::AlreadyFinalized("set_shape"));
        }
        self.shape = Some(Shape::new(nrows, ncols)?);
        Ok(())
    }

    pub fn set_dtype(&mut self, dtype: DType) -> Result<()> {
        if self.finalized {
            return Err(ArrayError::AlreadyFinalized("set_dtype"));
        }
        self.dtype = Some(dtype);
        Ok(())
    }

    /// Freeze shape and dtype; idempotent
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    pub fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    /// Complete record, once both shape and dtype are known
    pub fn record(&self) -> Option<MetadataRecord> {
        Some(MetadataRecord {
            shape: self.shape?,
            dtype: self.dtype?,
        })
    }

    /// Read the record from the reserved keys
    ///
    /// Returns `Ok(None)` if either key is absent.
    pub fn load<B: Backend>(backend: &B) -> Result<Option<MetadataRecord>> {
        let (shape_key, dtype_key) = keys::metadata_keys();

        let shape = match backend.get(shape_key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let dtype = match backend.get(dtype_key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        Ok(Some(MetadataRecord {
            shape: Shape::decode(&shape)?,
            dtype: DType::from_descriptor(&dtype)?,
        }))
    }

    /// Write the record under the reserved keys
    pub fn persist<B: Backend>(record: &MetadataRecord, backend: &mut B) -> Result<()> {
        let (shape_key, dtype_key) = keys::metadata_keys();
        let shape = record.shape.encode()?;

        backend.put(shape_key, &shape)?;
        backend.put(dtype_key, &record.dtype.to_descriptor())?;
        Ok(())
    }
}
