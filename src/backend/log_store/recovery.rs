//! Log Recovery
//!
//! Replays the log on open to rebuild the key index, and cuts off whatever a
//! crash left behind at the tail.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::backend::BackendResult;
use crate::error::BackendError;

use super::record::{file_header, LogRecord, RecordHeader};
use super::{ValuePointer, FILE_HEADER_SIZE, FILE_MAGIC, FILE_VERSION, RECORD_HEADER_SIZE};

/// Handles log replay after a restart or crash
pub struct LogRecovery;

/// A record found during replay, without its value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredEntry {
    pub lsn: u64,
    pub key: Vec<u8>,
    pub pointer: ValuePointer,
}

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub entries_recovered: u64,

    /// Number of records rejected by CRC or LSN checks
    pub entries_corrupted: u64,

    /// Last valid LSN (0 if the log holds no records)
    pub last_lsn: u64,

    /// Byte length of the valid prefix of the file
    pub valid_len: u64,

    /// Whether the file was cut back to `valid_len`
    pub was_truncated: bool,
}

impl LogRecovery {
    /// Recover records from a log file
    ///
    /// This will:
    /// 1. Validate the file header
    /// 2. Read records until the end, a torn record, or a bad checksum
    /// 3. Truncate everything after the last valid record
    /// 4. Return all valid records in order
    pub fn recover(path: &Path) -> BackendResult<(Vec<RecoveredEntry>, RecoveryResult)> {
        let file_len = std::fs::metadata(path)?.len();
        let (entries, mut result) = Self::scan(path)?;

        if result.valid_len < FILE_HEADER_SIZE {
            // Empty, or torn while the header itself was being written
            let mut file = OpenOptions::new().write(true).open(path)?;
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&file_header())?;
            file.sync_all()?;

            result.valid_len = FILE_HEADER_SIZE;
            result.was_truncated = file_len > 0;
        } else if result.valid_len < file_len {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;

            result.was_truncated = true;
            tracing::warn!(
                "Truncated {} from {} to {} bytes ({} records recovered, {} corrupted)",
                path.display(),
                file_len,
                result.valid_len,
                result.entries_recovered,
                result.entries_corrupted
            );
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> BackendResult<RecoveryResult> {
        let (_, result) = Self::scan(path)?;
        Ok(result)
    }

    /// True if `path` starts with a log file header
    pub fn has_valid_header(path: &Path) -> bool {
        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        match File::open(path).and_then(|mut f| f.read_exact(&mut header)) {
            Ok(()) => &header[0..4] == FILE_MAGIC,
            Err(_) => false,
        }
    }

    fn scan(path: &Path) -> BackendResult<(Vec<RecoveredEntry>, RecoveryResult)> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            valid_len: 0,
            was_truncated: false,
        };

        // Step 1: File header
        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        let read = read_full(&mut reader, &mut header)?;
        if read < header.len() {
            let expected = file_header();
            if header[..read] != expected[..read] {
                return Err(BackendError::InvalidLocation(format!(
                    "{} is not a DBArray log",
                    path.display()
                )));
            }
            return Ok((Vec::new(), result));
        }

        if &header[0..4] != FILE_MAGIC {
            return Err(BackendError::InvalidLocation(format!(
                "{} is not a DBArray log: bad magic {:?}",
                path.display(),
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != FILE_VERSION {
            return Err(BackendError::Corruption(format!(
                "Unsupported log version: {}",
                version
            )));
        }

        result.valid_len = FILE_HEADER_SIZE;

        // Step 2: Records
        let mut entries = Vec::new();
        let mut position = FILE_HEADER_SIZE;
        let mut header_buf = [0u8; RECORD_HEADER_SIZE];

        loop {
            let read = read_full(&mut reader, &mut header_buf)?;
            if read == 0 {
                break;
            }
            if read < RECORD_HEADER_SIZE {
                tracing::debug!("Torn record header at offset {}", position);
                break;
            }

            let record = RecordHeader::parse(&header_buf)?;
            let record_end = position + RECORD_HEADER_SIZE as u64 + record.len as u64;
            if record_end > file_len {
                tracing::debug!("Torn record payload at offset {}", position);
                break;
            }

            let mut bytes = vec![0u8; RECORD_HEADER_SIZE + record.len as usize];
            bytes[..RECORD_HEADER_SIZE].copy_from_slice(&header_buf);
            reader.read_exact(&mut bytes[RECORD_HEADER_SIZE..])?;

            let entry = match LogRecord::deserialize(&bytes) {
                Ok(entry) if entry.lsn > result.last_lsn => entry,
                Ok(entry) => {
                    tracing::warn!(
                        "Non-monotonic LSN {} after {} at offset {}",
                        entry.lsn,
                        result.last_lsn,
                        position
                    );
                    result.entries_corrupted += 1;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Corrupt record at offset {}: {}", position, e);
                    result.entries_corrupted += 1;
                    break;
                }
            };

            entries.push(RecoveredEntry {
                lsn: entry.lsn,
                pointer: entry.value_pointer(position),
                key: entry.key,
            });

            result.entries_recovered += 1;
            result.last_lsn = record.lsn;
            position = record_end;
            result.valid_len = position;
        }

        Ok((entries, result))
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
