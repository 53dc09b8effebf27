use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::{Identifier, Seed};

/// Files chosen for one label, in draw order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelection {
    pub label: String,
    pub files: Vec<String>,
}

/// A populated per-identifier directory, before archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedDataset {
    pub root: PathBuf,
    pub labels: Vec<LabelSelection>,
}

impl MaterializedDataset {
    pub fn file_count(&self) -> usize {
        self.labels.iter().map(|l| l.files.len()).sum()
    }
}

/// Summary of one completed generation. `archive` is informational; the
/// file may already have been delivered and removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub identifier: Identifier,
    /// `sha256:<hex>` of the identifier's canonical form.
    pub identifier_digest: String,
    pub seed: Seed,
    pub labels: Vec<LabelSelection>,
    pub archive: PathBuf,
}

impl DatasetManifest {
    pub fn new(identifier: Identifier, seed: Seed, labels: Vec<LabelSelection>, archive: PathBuf) -> Self {
        let identifier_digest = format!("sha256:{}", identifier.digest());
        Self {
            identifier,
            identifier_digest,
            seed,
            labels,
            archive,
        }
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.label.as_str()).collect()
    }
}
