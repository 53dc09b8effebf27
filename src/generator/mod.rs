pub mod locks;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::{IdentifierLog, LogError};
use crate::config::{ConfigError, GeneratorConfig};
use crate::dataset::{ArchiveBuilder, ArchiveError, DatasetManifest, DatasetMaterializer, MaterializeError};
use crate::selection::{FileSampler, LabelSelector, SeedDeriver, SeedError, SelectionError};
use crate::transport::{download_name, ArchiveStore, TransportError};
use crate::types::identifiers::{Identifier, IdentifierError, Seed};
use crate::types::kind::{ErrorKind, ResponseClass};

pub use locks::{IdentifierGuard, IdentifierLocks};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GeneratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneratorError::Config(e) => e.kind(),
            GeneratorError::Identifier(_) => ErrorKind::InvalidInput,
            GeneratorError::Seed(e) => e.kind(),
            GeneratorError::Selection(e) => e.kind(),
            GeneratorError::Materialize(e) => e.kind(),
            GeneratorError::Archive(e) => e.kind(),
            GeneratorError::Transport(e) => e.kind(),
        }
    }

    pub fn response_class(&self) -> ResponseClass {
        self.kind().response_class()
    }

    /// Message safe to show a caller. Server-side failures get a fixed text;
    /// nothing returned here contains a filesystem path.
    pub fn public_message(&self) -> String {
        let selection = match self {
            GeneratorError::Selection(e) => Some(e),
            GeneratorError::Materialize(MaterializeError::Selection(e)) => Some(e),
            _ => None,
        };

        match (self, selection) {
            (GeneratorError::Identifier(e), _) => format!("Invalid identifier: {e}"),
            (_, Some(SelectionError::MissingLabel { label, .. })) => {
                format!("Subdirectory {label} does not exist in the source data")
            }
            (_, Some(SelectionError::EmptySourcePool { label })) => {
                format!("Subdirectory {label} has no source files")
            }
            (GeneratorError::Transport(TransportError::UnsafeFileName(_)), _) => {
                "Invalid archive name.".to_string()
            }
            (GeneratorError::Transport(TransportError::ArchiveNotFound(_)), _) => {
                "File not found.".to_string()
            }
            _ => match self.response_class() {
                ResponseClass::ClientError => "Invalid request.".to_string(),
                ResponseClass::NotFound => "Not found.".to_string(),
                ResponseClass::ServerError => "Failed to generate dataset".to_string(),
            },
        }
    }
}

/// Progress of one request. Used for tracing only; nothing resumes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SeedDerived,
    LabelsSelected,
    FilesCopied,
    Archived,
}

/// A finished request.
#[derive(Debug)]
pub struct GeneratedDataset {
    pub manifest: DatasetManifest,
    /// Identifier log failure tolerated under the `warn` policy.
    pub log_error: Option<LogError>,
}

impl GeneratedDataset {
    pub fn archive_path(&self) -> &Path {
        &self.manifest.archive
    }

    /// File name to hand to [`ArchiveStore::open`].
    pub fn download_name(&self) -> Option<&str> {
        download_name(&self.manifest.archive)
    }
}

/// End-to-end pipeline: identifier in, archive out.
///
/// Holds no per-request state; every call to [`DatasetGenerator::generate`]
/// works from its own identifier and the immutable configuration.
#[derive(Debug)]
pub struct DatasetGenerator {
    config: GeneratorConfig,
    deriver: SeedDeriver,
    selector: LabelSelector,
    materializer: DatasetMaterializer,
    archiver: ArchiveBuilder,
    locks: IdentifierLocks,
}

impl DatasetGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;

        let log = IdentifierLog::new(&config.identifier_log, config.log_time_zone()?);
        let deriver = SeedDeriver::new(log, config.log_failure);
        let selector = LabelSelector::new(config.vocabulary()?, config.label_count);
        let sampler = FileSampler::new(&config.source_root, config.files_per_label, config.empty_pool);
        let materializer = DatasetMaterializer::new(sampler, &config.output_root, &config.folder_prefix);

        Ok(Self {
            config,
            deriver,
            selector,
            materializer,
            archiver: ArchiveBuilder::new(),
            locks: IdentifierLocks::new(),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, GeneratorError> {
        Self::new(GeneratorConfig::from_json_file(path)?)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Output-side lookup for serving the archives this generator writes.
    pub fn archive_store(&self) -> ArchiveStore {
        ArchiveStore::new(&self.config.output_root)
    }

    pub fn dataset_dir(&self, identifier: &Identifier) -> PathBuf {
        self.materializer.dataset_dir(identifier)
    }

    /// Labels `identifier` would receive. Pure: nothing is logged or written.
    pub fn labels_for(&self, identifier: &Identifier) -> Result<Vec<String>, GeneratorError> {
        Ok(self.selector.select(Seed::from_identifier(identifier))?)
    }

    pub fn generate_from_str(&self, raw: &str) -> Result<GeneratedDataset, GeneratorError> {
        let identifier = Identifier::parse(raw)?;
        self.generate(&identifier)
    }

    pub fn generate(&self, identifier: &Identifier) -> Result<GeneratedDataset, GeneratorError> {
        let _guard = self.locks.acquire(identifier);

        let mut stage = Stage::Received;
        let result = self.run(identifier, &mut stage);

        match &result {
            Ok(generated) => info!(
                identifier = %identifier,
                seed = generated.manifest.seed.value(),
                archive = %generated.manifest.archive.display(),
                "dataset generated"
            ),
            Err(e) => warn!(identifier = %identifier, stage = ?stage, error = %e, "dataset generation failed"),
        }
        result
    }

    fn run(&self, identifier: &Identifier, stage: &mut Stage) -> Result<GeneratedDataset, GeneratorError> {
        debug!(identifier = %identifier, "request received");

        let derivation = self.deriver.derive(identifier)?;
        let seed = derivation.seed;
        *stage = Stage::SeedDerived;

        let labels = self.selector.select(seed)?;
        *stage = Stage::LabelsSelected;
        debug!(identifier = %identifier, labels = ?labels, "labels selected");

        // The same seed re-seeds file sampling for every label; it is not
        // derived (or logged) a second time.
        let dataset = self.materializer.materialize(identifier, seed, &labels)?;
        *stage = Stage::FilesCopied;
        debug!(identifier = %identifier, files = dataset.file_count(), "files copied");

        let archive = match self.archiver.build(&dataset.root) {
            Ok(path) => path,
            Err(e) => {
                if dataset.root.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(&dataset.root) {
                        warn!(path = %dataset.root.display(), error = %cleanup, "failed to remove unarchived dataset");
                    }
                }
                return Err(e.into());
            }
        };
        *stage = Stage::Archived;

        Ok(GeneratedDataset {
            manifest: DatasetManifest::new(identifier.clone(), seed, dataset.labels, archive),
            log_error: derivation.log_error,
        })
    }
}
