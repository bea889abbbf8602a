//! Error management.

use crate::storage::StorageError;
use derive_more::Display;

/// A resource a join opens before it starts producing results.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    #[display(fmt = "result store")]
    ResultStore,
    #[display(fmt = "scan on the outer relation")]
    OuterScan,
    #[display(fmt = "scan on the inner relation")]
    InnerScan,
    #[display(fmt = "index on the inner relation")]
    Index,
}

#[derive(Debug, Display)]
pub enum JoinError {
    #[display(fmt = "invalid descriptor: {}", _0)]
    InvalidDescriptor(String),
    #[display(fmt = "cannot open {}: {}", resource, source)]
    ResourceOpenFailure {
        resource: Resource,
        source: StorageError,
    },
    #[display(fmt = "storage failure: {}", _0)]
    StorageIoFailure(StorageError),
}

impl JoinError {
    pub(crate) fn open_failure(resource: Resource) -> impl FnOnce(StorageError) -> Self {
        move |source| JoinError::ResourceOpenFailure { resource, source }
    }
}

impl std::error::Error for JoinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JoinError::InvalidDescriptor(_) => None,
            JoinError::ResourceOpenFailure { source, .. } => Some(source),
            JoinError::StorageIoFailure(source) => Some(source),
        }
    }
}

impl From<StorageError> for JoinError {
    fn from(e: StorageError) -> Self {
        JoinError::StorageIoFailure(e)
    }
}

pub type Result<T> = std::result::Result<T, JoinError>;
