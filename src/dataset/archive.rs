use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Timelike, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::types::kind::ErrorKind;

pub const ARCHIVE_EXTENSION: &str = "zip";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Directory to archive does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("Path to archive is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Path has no usable file name: {0}")]
    Unnamed(PathBuf),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error("Walked path {path} is outside archive root {root}")]
    OutsideRoot { root: PathBuf, path: PathBuf },
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::MissingDirectory(_)
            | ArchiveError::NotADirectory(_)
            | ArchiveError::Unnamed(_) => ErrorKind::InvalidInput,
            ArchiveError::NonUtf8Path(_) | ArchiveError::OutsideRoot { .. } => ErrorKind::Unexpected,
            ArchiveError::Zip(_) | ArchiveError::Walk(_) | ArchiveError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

/// Packs a directory into `<dir>.zip` beside it, then removes the directory.
///
/// Entries are written in file-name order with `/` separators, so two
/// archives of identical trees list identical entries.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    compression: CompressionMethod,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store entries uncompressed.
    pub fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }

    /// Where [`ArchiveBuilder::build`] will place the archive for `dir`.
    pub fn archive_path_for(dir: &Path) -> Result<PathBuf, ArchiveError> {
        let name = match dir.components().next_back() {
            Some(Component::Normal(name)) => name,
            _ => return Err(ArchiveError::Unnamed(dir.to_path_buf())),
        };

        let mut file_name = OsString::from(name);
        file_name.push(".");
        file_name.push(ARCHIVE_EXTENSION);
        Ok(dir.with_file_name(file_name))
    }

    pub fn build(&self, dir: &Path) -> Result<PathBuf, ArchiveError> {
        if !dir.exists() {
            return Err(ArchiveError::MissingDirectory(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(ArchiveError::NotADirectory(dir.to_path_buf()));
        }

        let archive_path = Self::archive_path_for(dir)?;
        let mut partial = archive_path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = self.write_archive(dir, &partial) {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!(path = %partial.display(), error = %cleanup, "failed to remove partial archive");
                }
            }
            return Err(e);
        }
        fs::rename(&partial, &archive_path)?;

        // The archive now owns the data; a leftover directory is cleared by the next run.
        discard_source(dir);

        debug!(archive = %archive_path.display(), "archive written");
        Ok(archive_path)
    }

    fn write_archive(&self, dir: &Path, target: &Path) -> Result<(), ArchiveError> {
        let file = fs::File::create(target)?;
        let mut zw = ZipWriter::new(file);

        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let name = entry_name(dir, entry.path())?;
            let modified = entry.metadata()?.modified()?;
            let options = SimpleFileOptions::default()
                .compression_method(self.compression)
                .last_modified_time(zip_timestamp(modified));

            if entry.file_type().is_dir() {
                zw.add_directory(name, options.unix_permissions(0o755))?;
            } else {
                zw.start_file(name, options.unix_permissions(0o644))?;
                let mut src = fs::File::open(entry.path())?;
                io::copy(&mut src, &mut zw)?;
            }
        }

        let file = zw.finish()?;
        file.sync_all()?;
        Ok(())
    }
}

fn discard_source(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "archive written but source directory was not removed");
            false
        }
    }
}

/// Relative, `/`-separated entry name.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let rel = path.strip_prefix(root).map_err(|_| ArchiveError::OutsideRoot {
        root: root.to_path_buf(),
        path: path.to_path_buf(),
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ArchiveError::NonUtf8Path(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Zip timestamps cover 1980..=2107; anything outside falls back to the epoch of the format.
fn zip_timestamp(modified: SystemTime) -> zip::DateTime {
    let at: DateTime<Utc> = modified.into();
    let Ok(year) = u16::try_from(at.year()) else {
        return zip::DateTime::default();
    };

    zip::DateTime::from_date_and_time(
        year,
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .unwrap_or_default()
}
