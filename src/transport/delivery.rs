use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::transport::TransportError;

/// Result of a completed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub bytes: u64,
    /// False when the archive could not be removed afterwards, or was
    /// replaced by a newer archive while it was being served.
    pub removed: bool,
}

/// An open archive that is deleted only once every byte has been written out.
///
/// Dropping it without calling [`ArchiveDelivery::deliver`], or a failed
/// delivery, leaves the archive in place so the download can be retried.
///
/// The generator's per-identifier lock is released once the archive is
/// written, so a repeat request may rename a fresh archive over this path
/// while it is still being served. The open handle keeps streaming the old
/// bytes, and the fresh archive is left in place rather than deleted.
#[derive(Debug)]
pub struct ArchiveDelivery {
    path: PathBuf,
    file: File,
    len: u64,
    modified: Option<SystemTime>,
}

impl ArchiveDelivery {
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TransportError::ArchiveNotFound(path.display().to_string()),
            _ => TransportError::Io(e),
        })?;
        let meta = file.metadata()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn deliver<W: Write>(self, writer: &mut W) -> Result<Delivered, TransportError> {
        let ArchiveDelivery {
            path,
            mut file,
            len,
            modified,
        } = self;

        let written = io::copy(&mut file, writer).map_err(TransportError::Delivery)?;
        writer.flush().map_err(TransportError::Delivery)?;
        if written != len {
            return Err(TransportError::Truncated {
                expected: len,
                written,
            });
        }

        drop(file);
        if replaced_since_open(&path, len, modified) {
            debug!(path = %path.display(), bytes = written, "archive replaced during delivery; keeping it");
            return Ok(Delivered {
                bytes: written,
                removed: false,
            });
        }

        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove delivered archive");
                false
            }
        };

        debug!(path = %path.display(), bytes = written, removed, "archive delivered");
        Ok(Delivered {
            bytes: written,
            removed,
        })
    }
}

fn replaced_since_open(path: &Path, len: u64, modified: Option<SystemTime>) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.len() != len || meta.modified().ok() != modified,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn delivery_streams_bytes_then_removes_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset_3.zip");
        fs::write(&path, b"zip bytes").unwrap();

        let delivery = ArchiveDelivery::open(&path).unwrap();
        assert_eq!(delivery.len(), 9);

        let mut out = Vec::new();
        let delivered = delivery.deliver(&mut out).unwrap();

        assert_eq!(out, b"zip bytes");
        assert_eq!(delivered, Delivered { bytes: 9, removed: true });
        assert!(!path.exists());
    }

    #[test]
    fn failed_delivery_keeps_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset_4.zip");
        fs::write(&path, b"zip bytes").unwrap();

        let err = ArchiveDelivery::open(&path)
            .unwrap()
            .deliver(&mut FailingWriter)
            .unwrap_err();

        assert!(matches!(err, TransportError::Delivery(_)));
        assert!(path.exists());
    }

    #[test]
    fn archive_replaced_during_delivery_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset_6.zip");
        fs::write(&path, b"first archive").unwrap();

        let delivery = ArchiveDelivery::open(&path).unwrap();

        // A repeat request renames its fresh archive over the same name.
        let fresh = dir.path().join("dataset_6.zip.partial");
        fs::write(&fresh, b"second, longer archive").unwrap();
        fs::rename(&fresh, &path).unwrap();

        let mut out = Vec::new();
        let delivered = delivery.deliver(&mut out).unwrap();

        assert_eq!(out, b"first archive");
        assert!(!delivered.removed);
        assert_eq!(fs::read(&path).unwrap(), b"second, longer archive");
    }

    #[test]
    fn dropped_delivery_keeps_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset_5.zip");
        fs::write(&path, b"zip").unwrap();

        drop(ArchiveDelivery::open(&path).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn opening_missing_archive_is_not_found() {
        let dir = tempdir().unwrap();
        let err = ArchiveDelivery::open(&dir.path().join("gone.zip")).unwrap_err();
        assert!(matches!(err, TransportError::ArchiveNotFound(_)));
    }
}
