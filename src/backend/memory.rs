//! In-memory backend
//!
//! BTreeMap-backed store. Ordered keys, no durability.

use std::collections::BTreeMap;

use super::{Backend, BackendResult};

/// Ordered in-memory key-value store
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.data.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> BackendResult<Vec<Vec<u8>>> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn close(self) -> BackendResult<()> {
        Ok(())
    }
}
