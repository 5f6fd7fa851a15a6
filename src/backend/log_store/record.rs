//! Log record definitions
//!
//! Defines the structure of individual log records and their byte layout.

use crate::error::BackendError;

use super::{FILE_MAGIC, FILE_VERSION, RECORD_HEADER_SIZE};
use crate::backend::BackendResult;

/// A single put in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    pub key: Vec<u8>,

    pub value: Vec<u8>,
}

/// Location of a value inside the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePointer {
    /// Absolute file offset of the first value byte
    pub offset: u64,
    pub len: u32,
}

impl LogRecord {
    pub fn new(lsn: u64, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { lsn, key, value }
    }

    /// Payload bytes: key_len (4) + key + value
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(4 + self.key.len() + self.value.len());
        payload.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        payload.extend_from_slice(&self.key);
        payload.extend_from_slice(&self.value);
        payload
    }

    /// Full on-disk form: header + payload
    pub fn serialize(&self) -> BackendResult<Vec<u8>> {
        let payload = self.payload();
        let len = u32::try_from(payload.len()).map_err(|_| {
            BackendError::Corruption(format!(
                "Record payload too large: {} bytes",
                payload.len()
            ))
        })?;

        let mut bytes = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Parse a full record, validating length and CRC
    pub fn deserialize(bytes: &[u8]) -> BackendResult<Self> {
        let header = RecordHeader::parse(bytes)?;
        let payload = bytes
            .get(RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + header.len as usize)
            .ok_or_else(|| {
                BackendError::Corruption(format!(
                    "Incomplete record payload: expected {} bytes, got {}",
                    header.len,
                    bytes.len().saturating_sub(RECORD_HEADER_SIZE)
                ))
            })?;

        header.verify(payload)?;
        let key_len = payload_key_len(payload)?;
        Ok(Self {
            lsn: header.lsn,
            key: payload[4..4 + key_len].to_vec(),
            value: payload[4 + key_len..].to_vec(),
        })
    }

    /// Pointer to this record's value when the record starts at `record_offset`
    pub fn value_pointer(&self, record_offset: u64) -> ValuePointer {
        ValuePointer {
            offset: record_offset + (RECORD_HEADER_SIZE + 4 + self.key.len()) as u64,
            len: self.value.len() as u32,
        }
    }
}

/// Fixed-size record header: LSN (8) + CRC (4) + Len (4)
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl RecordHeader {
    pub fn parse(bytes: &[u8]) -> BackendResult<Self> {
        if bytes.len() < RECORD_HEADER_SIZE {
            return Err(BackendError::Corruption(format!(
                "Incomplete record header: expected {} bytes, got {}",
                RECORD_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Ok(Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        })
    }

    pub fn verify(&self, payload: &[u8]) -> BackendResult<()> {
        let actual = crc32fast::hash(payload);
        if actual != self.crc {
            return Err(BackendError::Corruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                self.lsn, self.crc, actual
            )));
        }
        Ok(())
    }
}

/// Key length prefix of a payload, checked against the payload size
pub(crate) fn payload_key_len(payload: &[u8]) -> BackendResult<usize> {
    if payload.len() < 4 {
        return Err(BackendError::Corruption(
            "Record payload missing key length".to_string(),
        ));
    }

    let key_len = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    if payload.len() < 4 + key_len {
        return Err(BackendError::Corruption(format!(
            "Record key overruns payload: key_len {} with {} payload bytes",
            key_len,
            payload.len()
        )));
    }

    Ok(key_len)
}

/// File header bytes: Magic (4) + Version (2)
pub(crate) fn file_header() -> Vec<u8> {
    let mut header = Vec::with_capacity(FILE_MAGIC.len() + 2);
    header.extend_from_slice(FILE_MAGIC);
    header.extend_from_slice(&FILE_VERSION.to_le_bytes());
    header
}
