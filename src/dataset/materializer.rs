use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::dataset::manifest::{LabelSelection, MaterializedDataset};
use crate::selection::{FileSampler, SelectionError};
use crate::types::identifiers::{Identifier, Seed};
use crate::types::kind::ErrorKind;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Source directory does not exist: {0}")]
    SourceRootMissing(PathBuf),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MaterializeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MaterializeError::SourceRootMissing(_) => ErrorKind::NotFound,
            MaterializeError::Selection(e) => e.kind(),
            MaterializeError::Copy { .. } | MaterializeError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

/// Copies each selected label's sampled files into a per-identifier directory.
///
/// Callers must not run two materializations for the same identifier at once;
/// both would target the same directory.
#[derive(Debug, Clone)]
pub struct DatasetMaterializer {
    sampler: FileSampler,
    output_root: PathBuf,
    folder_prefix: String,
}

impl DatasetMaterializer {
    pub fn new(sampler: FileSampler, output_root: impl Into<PathBuf>, folder_prefix: impl Into<String>) -> Self {
        Self {
            sampler,
            output_root: output_root.into(),
            folder_prefix: folder_prefix.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn dataset_dir(&self, identifier: &Identifier) -> PathBuf {
        self.output_root.join(format!("{}{}", self.folder_prefix, identifier))
    }

    pub fn materialize(
        &self,
        identifier: &Identifier,
        seed: Seed,
        labels: &[String],
    ) -> Result<MaterializedDataset, MaterializeError> {
        let source_root = self.sampler.source_root();
        if !source_root.is_dir() {
            return Err(MaterializeError::SourceRootMissing(source_root.to_path_buf()));
        }

        // Fail before touching the output tree if any label is absent.
        for label in labels {
            let dir = self.sampler.label_dir(label);
            if !dir.is_dir() {
                return Err(SelectionError::MissingLabel {
                    label: label.clone(),
                    path: dir,
                }
                .into());
            }
        }

        fs::create_dir_all(&self.output_root)?;
        let root = self.dataset_dir(identifier);

        // Leftover from a run that crashed before archiving.
        if root.exists() {
            warn!(path = %root.display(), "removing stale dataset directory");
            fs::remove_dir_all(&root)?;
        }

        match self.populate(&root, seed, labels) {
            Ok(selections) => Ok(MaterializedDataset {
                root,
                labels: selections,
            }),
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&root) {
                    if root.exists() {
                        warn!(path = %root.display(), error = %cleanup, "failed to remove partial dataset");
                    }
                }
                Err(e)
            }
        }
    }

    fn populate(&self, root: &Path, seed: Seed, labels: &[String]) -> Result<Vec<LabelSelection>, MaterializeError> {
        fs::create_dir_all(root)?;

        let mut selections = Vec::with_capacity(labels.len());
        for label in labels {
            let files = self.sampler.sample(seed, label)?;

            let src_dir = self.sampler.label_dir(label);
            let dst_dir = root.join(label);
            fs::create_dir_all(&dst_dir)?;

            for file in &files {
                copy_preserving_times(&src_dir.join(file), &dst_dir.join(file))?;
            }

            debug!(label = %label, files = files.len(), "label copied");
            selections.push(LabelSelection {
                label: label.clone(),
                files,
            });
        }

        Ok(selections)
    }
}

/// Copy contents and permissions, then carry over access and modification times.
fn copy_preserving_times(from: &Path, to: &Path) -> Result<(), MaterializeError> {
    let wrap = |source: std::io::Error| MaterializeError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    fs::copy(from, to).map_err(wrap)?;

    let meta = fs::metadata(from).map_err(wrap)?;
    let mut times = FileTimes::new().set_modified(meta.modified().map_err(wrap)?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    let dst = fs::OpenOptions::new().write(true).open(to).map_err(wrap)?;
    dst.set_times(times).map_err(wrap)?;
    Ok(())
}
