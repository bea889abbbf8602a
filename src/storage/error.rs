//! Error management.

use crate::types::RecordId;
use derive_more::Display;

#[derive(Debug, Display)]
pub enum StorageError {
    #[display(fmt = "I/O error: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "expected a record of {} bytes, got {}", expected, actual)]
    RecordSizeMismatch { expected: usize, actual: usize },
    #[display(fmt = "records of {} bytes do not fit pages of {} bytes", record_len, page_size)]
    InvalidRecordLen { record_len: usize, page_size: usize },
    #[display(fmt = "no record at {}", _0)]
    InvalidRecordId(RecordId),
    #[display(fmt = "record store is full")]
    StoreFull,
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
