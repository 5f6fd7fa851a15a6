//! Key scheme
//!
//! Maps array concepts onto the backend's byte-ordered key space.
//!
//! ## Key Layout
//! ```text
//! 0x00 "shape"                  → metadata: shape
//! 0x00 "dtype"                  → metadata: dtype descriptor
//! 0x01 [index: u64 big-endian]  → row data
//! 0x02 [name: utf-8]            → named attribute
//! ```
//! Row keys are fixed-width big-endian, so byte order equals index order and
//! a prefix scan over `0x01` yields rows in ascending index order. Decimal
//! keys would not (`"10" < "2"`).

/// Prefix byte of reserved metadata keys
pub const META_PREFIX: u8 = 0x00;

/// Prefix byte of row keys
pub const ROW_PREFIX: u8 = 0x01;

/// Prefix byte of attribute keys
pub const ATTR_PREFIX: u8 = 0x02;

/// Row key size: Prefix (1) + Index (8) = 9 bytes
pub const ROW_KEY_SIZE: usize = 9;

const SHAPE_KEY: &[u8] = b"\x00shape";
const DTYPE_KEY: &[u8] = b"\x00dtype";

/// Key for row `index`
pub fn row_key(index: u64) -> [u8; ROW_KEY_SIZE] {
    let mut key = [0u8; ROW_KEY_SIZE];
    key[0] = ROW_PREFIX;
    key[1..].copy_from_slice(&index.to_be_bytes());
    key
}

/// Inverse of [`row_key`]; `None` for keys outside the row space
pub fn parse_row_key(key: &[u8]) -> Option<u64> {
    if key.len() != ROW_KEY_SIZE || key[0] != ROW_PREFIX {
        return None;
    }
    let index: [u8; 8] = key[1..].try_into().ok()?;
    Some(u64::from_be_bytes(index))
}

/// The reserved `(shape, dtype)` keys
pub fn metadata_keys() -> (&'static [u8], &'static [u8]) {
    (SHAPE_KEY, DTYPE_KEY)
}

/// Key for attribute `name`
pub fn attr_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(ATTR_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Inverse of [`attr_key`]
pub fn parse_attr_key(key: &[u8]) -> Option<&str> {
    match key.split_first() {
        Some((&ATTR_PREFIX, name)) => std::str::from_utf8(name).ok(),
        _ => None,
    }
}
