//! Named attributes
//!
//! Small auxiliary values stored beside an array (a column mean, a label, a
//! version number). They live in their own key space and are never frozen by
//! finalization.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::dtype::{DType, Element, DESCRIPTOR_SIZE};
use crate::error::{ArrayError, Result};

/// Value of a named attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
    /// One-dimensional numeric vector with its dtype descriptor
    Vector {
        descriptor: [u8; DESCRIPTOR_SIZE],
        data: Vec<u8>,
    },
}

impl AttrValue {
    /// Build a vector attribute from a slice
    pub fn vector<T: Element>(values: &[T]) -> Self {
        let dtype = DType::of::<T>();
        let mut data = Vec::with_capacity(values.len() * T::WIDTH);
        for &value in values {
            value.write_to(dtype.byte_order(), &mut data);
        }

        AttrValue::Vector {
            descriptor: dtype.to_descriptor(),
            data,
        }
    }

    /// Read a vector attribute back as `T`
    pub fn as_vector<T: Element>(&self) -> Result<Vec<T>> {
        let (descriptor, data) = match self {
            AttrValue::Vector { descriptor, data } => (descriptor, data),
            other => {
                return Err(ArrayError::Codec(format!(
                    "Attribute is not a vector: {:?}",
                    other
                )))
            }
        };

        let dtype = DType::from_descriptor(descriptor)?;
        if data.len() % dtype.width() != 0 {
            return Err(ArrayError::Codec(format!(
                "Vector attribute of {} bytes is not a multiple of width {}",
                data.len(),
                dtype.width()
            )));
        }

        codec::decode(data, data.len() / dtype.width(), dtype)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}
