use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::EmptyPoolPolicy;
use crate::selection::{draw_indices, SelectionError};
use crate::types::identifiers::Seed;

/// Samples file names from one label's directory under the source root.
#[derive(Debug, Clone)]
pub struct FileSampler {
    source_root: PathBuf,
    files_per_label: usize,
    empty_pool: EmptyPoolPolicy,
}

impl FileSampler {
    pub fn new(source_root: impl Into<PathBuf>, files_per_label: usize, empty_pool: EmptyPoolPolicy) -> Self {
        Self {
            source_root: source_root.into(),
            files_per_label,
            empty_pool,
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn label_dir(&self, label: &str) -> PathBuf {
        self.source_root.join(label)
    }

    /// Current file names under `label`, sorted. Read fresh on every call.
    pub fn source_pool(&self, label: &str) -> Result<Vec<String>, SelectionError> {
        let dir = self.label_dir(label);
        if !dir.is_dir() {
            return Err(SelectionError::MissingLabel {
                label: label.to_string(),
                path: dir,
            });
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|source| SelectionError::Walk {
                label: label.to_string(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| SelectionError::NonUtf8FileName {
                    label: label.to_string(),
                    name: entry.file_name().to_string_lossy().into_owned(),
                })?;
            names.push(name.to_string());
        }

        // Directory order differs between filesystems.
        names.sort();
        Ok(names)
    }

    /// `min(files_per_label, pool size)` distinct names from `label`'s pool.
    pub fn sample(&self, seed: Seed, label: &str) -> Result<Vec<String>, SelectionError> {
        let pool = self.source_pool(label)?;

        if pool.is_empty() {
            match self.empty_pool {
                EmptyPoolPolicy::Strict => {
                    return Err(SelectionError::EmptySourcePool {
                        label: label.to_string(),
                    })
                }
                EmptyPoolPolicy::Lenient => warn!(label, "source pool is empty; selecting nothing"),
            }
        }

        let selected = sample_names(seed, &pool, self.files_per_label);
        debug!(label, pool = pool.len(), selected = selected.len(), "files sampled");
        Ok(selected)
    }
}

/// Draw up to `count` distinct names from an in-memory pool.
pub fn sample_names(seed: Seed, pool: &[String], count: usize) -> Vec<String> {
    let amount = count.min(pool.len());
    draw_indices(seed, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}
