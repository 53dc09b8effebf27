use std::path::{Path, PathBuf};

use crate::dataset::archive::ARCHIVE_EXTENSION;
use crate::transport::delivery::ArchiveDelivery;
use crate::transport::TransportError;
use crate::types::vocabulary::is_path_component;

/// Read side of the output root: finds archives by bare file name.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an existing archive. Only bare `*.zip` names are accepted, so a
    /// request can never address anything outside the root.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, TransportError> {
        let suffix = format!(".{ARCHIVE_EXTENSION}");
        let stem_ok = file_name
            .strip_suffix(&suffix)
            .is_some_and(|stem| !stem.is_empty());

        if !is_path_component(file_name) || !stem_ok || file_name.starts_with('.') {
            return Err(TransportError::UnsafeFileName(file_name.to_string()));
        }

        let path = self.root.join(file_name);
        if !path.is_file() {
            return Err(TransportError::ArchiveNotFound(file_name.to_string()));
        }
        Ok(path)
    }

    pub fn open(&self, file_name: &str) -> Result<ArchiveDelivery, TransportError> {
        let path = self.resolve(file_name)?;
        ArchiveDelivery::open(&path)
    }
}

/// Name a transport advertises for an archive path.
pub fn download_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
