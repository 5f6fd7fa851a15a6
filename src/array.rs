//! Array handle
//!
//! The public facade: one persistent array over one exclusively owned backend.
//!
//! ## States
//! ```text
//! Uninitialized ──(shape + dtype set)──▶ Configured ──(first row write)──▶ Finalized
//! ```
//! Row I/O is allowed in Configured and Finalized. Opening a location that
//! already holds metadata starts in Finalized.

use std::marker::PhantomData;
use std::path::Path;

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

use crate::attrs::AttrValue;
use crate::backend::{Backend, LogBackend};
use crate::codec;
use crate::config::Config;
use crate::dtype::{DType, Element};
use crate::error::{ArrayError, Result};
use crate::keys;
use crate::metadata::{MetadataRecord, MetadataStore, Shape};

/// Lifecycle state of an [`ArrayHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Shape or dtype still missing; no row I/O
    Uninitialized,
    /// Shape and dtype set, no row written yet; metadata still mutable
    Configured,
    /// Metadata frozen
    Finalized,
}

/// A two-dimensional array persisted row by row in a [`Backend`]
pub struct ArrayHandle<B: Backend = LogBackend> {
    backend: B,
    meta: MetadataStore,
}

impl ArrayHandle<LogBackend> {
    /// Open or create an array in the directory `location`
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(&Config::at(location.as_ref()))
    }

    /// Open or create an array with explicit backend settings
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let backend = LogBackend::open(config)?;
        Self::with_backend(backend)
    }

    /// Persist `matrix` into a new array at `location`
    ///
    /// Shape comes from the matrix dimensions and the dtype from `T`
    /// (little-endian). Fails with `AlreadyFinalized` if `location` already
    /// holds an array.
    pub fn from_dense<S, T>(matrix: &ArrayBase<S, Ix2>, location: impl AsRef<Path>) -> Result<Self>
    where
        S: Data<Elem = T>,
        T: Element,
    {
        Self::from_dense_with_config(matrix, &Config::at(location.as_ref()))
    }

    /// [`ArrayHandle::from_dense`] with explicit backend settings
    pub fn from_dense_with_config<S, T>(matrix: &ArrayBase<S, Ix2>, config: &Config) -> Result<Self>
    where
        S: Data<Elem = T>,
        T: Element,
    {
        let backend = LogBackend::open(config)?;
        Self::from_dense_into(matrix, backend)
    }
}

impl<B: Backend> ArrayHandle<B> {
    /// Wrap an already open backend, loading metadata if present
    pub fn with_backend(backend: B) -> Result<Self> {
        let meta = match MetadataStore::load(&backend)? {
            Some(record) => {
                tracing::debug!(
                    "Loaded array metadata: shape=({}, {}), dtype={}",
                    record.shape.nrows,
                    record.shape.ncols,
                    record.dtype
                );
                MetadataStore::from_record(record)
            }
            None => MetadataStore::new(),
        };

        Ok(Self { backend, meta })
    }

    /// Persist `matrix` into `backend` and return the finalized handle
    pub fn from_dense_into<S, T>(matrix: &ArrayBase<S, Ix2>, backend: B) -> Result<Self>
    where
        S: Data<Elem = T>,
        T: Element,
    {
        let mut handle = Self::with_backend(backend)?;
        let (nrows, ncols) = matrix.dim();

        handle.set_shape(to_i64(nrows)?, to_i64(ncols)?)?;
        handle.set_dtype(DType::of::<T>())?;

        for (i, row) in matrix.outer_iter().enumerate() {
            match row.as_slice() {
                Some(values) => handle.set_row(i as i64, values)?,
                None => handle.set_row(i as i64, &row.to_vec())?,
            }
        }

        tracing::debug!("Imported {}x{} {} array", nrows, ncols, DType::of::<T>());
        Ok(handle)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Set the shape; allowed until the first row is written
    pub fn set_shape(&mut self, nrows: i64, ncols: i64) -> Result<()> {
        self.meta.set_shape(nrows, ncols)?;
        self.persist_if_configured()
    }

    /// Set the dtype; allowed until the first row is written
    ///
    /// Descriptor strings go through `str::parse`:
    /// `handle.set_dtype("float32".parse()?)`.
    pub fn set_dtype(&mut self, dtype: DType) -> Result<()> {
        self.meta.set_dtype(dtype)?;
        self.persist_if_configured()
    }

    /// Change the shape of an array
    ///
    /// Existing row keys would all have to be rewritten, so this is refused
    /// once data exists. Before that it behaves like [`set_shape`](Self::set_shape).
    pub fn reshape(&mut self, nrows: i64, ncols: i64) -> Result<()> {
        if self.meta.is_finalized() {
            return Err(ArrayError::Unsupported(format!(
                "reshape to ({}, {}) after data was written",
                nrows, ncols
            )));
        }
        self.set_shape(nrows, ncols)
    }

    /// Change the dtype of an array; refused once data exists
    pub fn retype(&mut self, dtype: DType) -> Result<()> {
        if self.meta.is_finalized() {
            return Err(ArrayError::Unsupported(format!(
                "retype to {} after data was written",
                dtype
            )));
        }
        self.set_dtype(dtype)
    }

    pub fn shape(&self) -> Option<Shape> {
        self.meta.shape()
    }

    pub fn dtype(&self) -> Option<DType> {
        self.meta.dtype()
    }

    pub fn state(&self) -> State {
        if self.meta.is_finalized() {
            State::Finalized
        } else if self.meta.record().is_some() {
            State::Configured
        } else {
            State::Uninitialized
        }
    }

    /// Number of rows (0 before a shape is set)
    pub fn len(&self) -> u64 {
        self.meta.shape().map_or(0, |shape| shape.nrows)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Row Access
    // =========================================================================

    /// Read row `index`
    pub fn get_row<T: Element>(&self, index: i64) -> Result<Vec<T>> {
        let record = self.record()?;
        let row = check_index(index, record.shape.nrows)?;
        codec::check_element::<T>(record.dtype)?;

        let bytes = self
            .backend
            .get(&keys::row_key(row))?
            .ok_or(ArrayError::RowNotFound(row))?;

        codec::decode(&bytes, to_usize(record.shape.ncols)?, record.dtype)
    }

    /// Write row `index`, finalizing the metadata on first write
    pub fn set_row<T: Element>(&mut self, index: i64, values: &[T]) -> Result<()> {
        let record = self.record()?;
        let row = check_index(index, record.shape.nrows)?;
        let bytes = codec::encode(values, to_usize(record.shape.ncols)?, record.dtype)?;

        self.backend.put(&keys::row_key(row), &bytes)?;

        if !self.meta.is_finalized() {
            self.meta.finalize();
            tracing::debug!("Array finalized by first write (row {})", row);
        }
        Ok(())
    }

    /// Read several rows into a matrix, in the order given
    pub fn get_rows<T: Element>(&self, indices: &[i64]) -> Result<Array2<T>> {
        let record = self.record()?;
        let ncols = to_usize(record.shape.ncols)?;
        for &index in indices {
            check_index(index, record.shape.nrows)?;
        }

        // Grows with decoded rows; the declared shape may be far larger than
        // what is stored
        let mut data = Vec::new();
        for &index in indices {
            data.extend(self.get_row::<T>(index)?);
        }

        Array2::from_shape_vec((indices.len(), ncols), data)
            .map_err(|e| ArrayError::Codec(e.to_string()))
    }

    /// Write the rows of `rows` to `indices`, pairwise
    ///
    /// All indices and the matrix dimensions are checked before anything is
    /// written.
    pub fn set_rows<S, T>(&mut self, indices: &[i64], rows: &ArrayBase<S, Ix2>) -> Result<()>
    where
        S: Data<Elem = T>,
        T: Element,
    {
        let record = self.record()?;
        let ncols = to_usize(record.shape.ncols)?;
        codec::check_element::<T>(record.dtype)?;

        if rows.nrows() != indices.len() || rows.ncols() != ncols {
            return Err(ArrayError::Codec(format!(
                "Expected a {}x{} matrix, got {}x{}",
                indices.len(),
                ncols,
                rows.nrows(),
                rows.ncols()
            )));
        }
        for &index in indices {
            check_index(index, record.shape.nrows)?;
        }

        for (&index, row) in indices.iter().zip(rows.outer_iter()) {
            self.set_row(index, &row.to_vec())?;
        }
        Ok(())
    }

    /// Read `rows`, keeping only the columns in `cols`
    pub fn select<T: Element>(&self, rows: &[i64], cols: &[i64]) -> Result<Array2<T>> {
        let record = self.record()?;
        let columns = cols
            .iter()
            .map(|&col| check_index(col, record.shape.ncols).and_then(to_usize))
            .collect::<Result<Vec<_>>>()?;

        let full = self.get_rows::<T>(rows)?;
        Ok(full.select(Axis(1), &columns))
    }

    /// Materialize the whole array
    ///
    /// Fails with `IncompleteArray` naming the first missing row; missing
    /// rows are never filled in.
    pub fn to_dense<T: Element>(&self) -> Result<Array2<T>> {
        let record = self.record()?;
        codec::check_element::<T>(record.dtype)?;
        let nrows = to_usize(record.shape.nrows)?;
        let ncols = to_usize(record.shape.ncols)?;

        let mut data = Vec::new();
        for row in 0..record.shape.nrows {
            match self.get_row::<T>(row as i64) {
                Ok(values) => data.extend(values),
                Err(ArrayError::RowNotFound(missing)) => {
                    return Err(ArrayError::IncompleteArray { missing })
                }
                Err(e) => return Err(e),
            }
        }

        Array2::from_shape_vec((nrows, ncols), data).map_err(|e| ArrayError::Codec(e.to_string()))
    }

    /// Indices of rows that have been written, ascending
    pub fn stored_rows(&self) -> Result<Vec<u64>> {
        Ok(self
            .backend
            .keys_with_prefix(&[keys::ROW_PREFIX])?
            .iter()
            .filter_map(|key| keys::parse_row_key(key))
            .collect())
    }

    /// Iterate over written rows in index order
    pub fn rows<T: Element>(&self) -> Result<Rows<'_, B, T>> {
        let record = self.record()?;
        codec::check_element::<T>(record.dtype)?;

        Ok(Rows {
            handle: self,
            indices: self.stored_rows()?.into_iter(),
            _marker: PhantomData,
        })
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Store a named attribute, replacing any previous value
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<()> {
        check_attr_name(name)?;
        let bytes = value.into().encode()?;
        self.backend.put(&keys::attr_key(name), &bytes)?;
        Ok(())
    }

    pub fn get_attr(&self, name: &str) -> Result<Option<AttrValue>> {
        check_attr_name(name)?;
        match self.backend.get(&keys::attr_key(name))? {
            Some(bytes) => AttrValue::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Names of all stored attributes, sorted
    pub fn attr_names(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .keys_with_prefix(&[keys::ATTR_PREFIX])?
            .iter()
            .filter_map(|key| keys::parse_attr_key(key).map(str::to_string))
            .collect())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Close the backend, consuming the handle
    pub fn close(self) -> Result<()> {
        let state = self.state();
        self.backend.close()?;
        tracing::debug!("Array closed in state {:?}", state);
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn record(&self) -> Result<MetadataRecord> {
        self.meta.record().ok_or(ArrayError::NotInitialized)
    }

    fn persist_if_configured(&mut self) -> Result<()> {
        if let Some(record) = self.meta.record() {
            MetadataStore::persist(&record, &mut self.backend)?;
            tracing::debug!(
                "Array configured: shape=({}, {}), dtype={}",
                record.shape.nrows,
                record.shape.ncols,
                record.dtype
            );
        }
        Ok(())
    }
}

/// Iterator over the written rows of an array, see [`ArrayHandle::rows`]
pub struct Rows<'a, B: Backend, T> {
    handle: &'a ArrayHandle<B>,
    indices: std::vec::IntoIter<u64>,
    _marker: PhantomData<T>,
}

impl<B: Backend, T: Element> Iterator for Rows<'_, B, T> {
    type Item = Result<(u64, Vec<T>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        Some(self.handle.get_row(index as i64).map(|row| (index, row)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

fn check_index(index: i64, len: u64) -> Result<u64> {
    if index < 0 || index as u64 >= len {
        return Err(ArrayError::IndexOutOfRange { index, len });
    }
    Ok(index as u64)
}

fn check_attr_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ArrayError::Validation(
            "Attribute name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ArrayError::Validation(format!("{} does not fit in usize", value)))
}

fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| ArrayError::Validation(format!("{} does not fit in i64", value)))
}
