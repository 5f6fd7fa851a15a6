//! Row codec
//!
//! Converts a fixed-length row of numbers to and from the bytes stored under
//! a row key.
//!
//! ## Row Format
//! ```text
//! ┌───────────┬───────────┬─────┬──────────────────┐
//! │ Elem 0    │ Elem 1    │ ... │ Elem ncols-1     │
//! │ (width)   │ (width)   │     │ (width)          │
//! └───────────┴───────────┴─────┴──────────────────┘
//! ```
//! No header: the dtype and ncols come from the array metadata, so a row
//! blob is exactly `ncols * width` bytes.

use crate::dtype::{DType, Element};
use crate::error::{ArrayError, Result};

/// Encode `values` as a row of `ncols` elements of `dtype`
pub fn encode<T: Element>(values: &[T], ncols: usize, dtype: DType) -> Result<Vec<u8>> {
    check_element::<T>(dtype)?;

    if values.len() != ncols {
        return Err(ArrayError::Codec(format!(
            "Row length mismatch: expected {} values, got {}",
            ncols,
            values.len()
        )));
    }

    let order = dtype.byte_order();
    let mut bytes = Vec::with_capacity(row_size(ncols, dtype)?);
    for &value in values {
        value.write_to(order, &mut bytes);
    }

    Ok(bytes)
}

/// Decode a row blob produced by [`encode`]
pub fn decode<T: Element>(bytes: &[u8], ncols: usize, dtype: DType) -> Result<Vec<T>> {
    check_element::<T>(dtype)?;

    let expected = row_size(ncols, dtype)?;
    if bytes.len() != expected {
        return Err(ArrayError::Codec(format!(
            "Row size mismatch: expected {} bytes ({} x {}), got {}",
            expected,
            ncols,
            dtype.width(),
            bytes.len()
        )));
    }

    let order = dtype.byte_order();
    Ok(bytes
        .chunks_exact(dtype.width())
        .map(|chunk| T::read_from(chunk, order))
        .collect())
}

/// Encoded size of a row in bytes
pub fn row_size(ncols: usize, dtype: DType) -> Result<usize> {
    ncols.checked_mul(dtype.width()).ok_or_else(|| {
        ArrayError::Codec(format!(
            "Row of {} x {} bytes does not fit in memory",
            ncols,
            dtype.width()
        ))
    })
}

/// Fail with a codec error unless `T` has `dtype`'s kind and width
pub(crate) fn check_element<T: Element>(dtype: DType) -> Result<()> {
    if dtype.matches::<T>() {
        return Ok(());
    }

    Err(ArrayError::Codec(format!(
        "Element type {} does not match array dtype {}",
        std::any::type_name::<T>(),
        dtype.name()
    )))
}
