//! Seams for the HTTP layer that serves archives.
//!
//! The crate does not run a server. A transport resolves a requested file
//! name through [`ArchiveStore`], streams it with [`ArchiveDelivery`], and
//! maps failures with [`crate::types::ErrorKind::response_class`].

pub mod delivery;
pub mod store;

use thiserror::Error;

use crate::types::kind::ErrorKind;

pub use delivery::{ArchiveDelivery, Delivered};
pub use store::{download_name, ArchiveStore};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unsafe archive file name: {0:?}")]
    UnsafeFileName(String),
    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),
    #[error("Archive delivery failed: {0}")]
    Delivery(#[source] std::io::Error),
    #[error("Archive delivery truncated: wrote {written} of {expected} bytes")]
    Truncated { expected: u64, written: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::UnsafeFileName(_) => ErrorKind::InvalidInput,
            TransportError::ArchiveNotFound(_) => ErrorKind::NotFound,
            TransportError::Delivery(_) | TransportError::Truncated { .. } | TransportError::Io(_) => {
                ErrorKind::IoFailure
            }
        }
    }
}
