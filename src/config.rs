use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::LogTimeZone;
use crate::types::kind::ErrorKind;
use crate::types::vocabulary::{is_path_component, Vocabulary, VocabularyError, VocabularySpec};

pub const DEFAULT_FOLDER_PREFIX: &str = "dataset_42028assg1_";
pub const DEFAULT_LABEL_COUNT: usize = 10;
pub const DEFAULT_FILES_PER_LABEL: usize = 500;
pub const DEFAULT_TIME_ZONE: &str = "Australia/Sydney";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid vocabulary: {0}")]
    Vocabulary(#[from] VocabularyError),
    #[error("{field} must be greater than zero")]
    ZeroCount { field: &'static str },
    #[error("label_count {label_count} exceeds vocabulary size {vocabulary_size}")]
    LabelCountExceedsVocabulary {
        label_count: usize,
        vocabulary_size: usize,
    },
    #[error("UTC offset out of range: {0} minutes")]
    InvalidUtcOffset(i32),
    #[error("Unknown time zone: {0:?}")]
    UnknownTimeZone(String),
    #[error("Folder prefix must be a non-empty file name fragment: {0:?}")]
    InvalidFolderPrefix(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Io(e) => ErrorKind::from_io(e),
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// What to do when a selected label's source directory holds no files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPoolPolicy {
    /// Select nothing for that label and carry on.
    #[default]
    Lenient,
    /// Fail the whole request.
    Strict,
}

/// What to do when the identifier log cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFailurePolicy {
    /// Emit a warning and keep generating.
    #[default]
    Warn,
    /// Fail the request.
    Fail,
}

// Serializable, comparable, explicit defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// One subdirectory per vocabulary label, each a flat pool of files.
    pub source_root: PathBuf,
    /// Where per-identifier directories and archives are written.
    pub output_root: PathBuf,
    /// CSV file recording every identifier seen.
    pub identifier_log: PathBuf,
    #[serde(default = "default_folder_prefix")]
    pub folder_prefix: String,
    #[serde(default = "default_label_count")]
    pub label_count: usize,
    #[serde(default = "default_files_per_label")]
    pub files_per_label: usize,
    #[serde(default)]
    pub vocabulary: VocabularySpec,
    #[serde(default)]
    pub empty_pool: EmptyPoolPolicy,
    #[serde(default)]
    pub log_failure: LogFailurePolicy,
    /// IANA zone for identifier-log timestamps.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Fixed offset east of UTC. Takes precedence over `time_zone` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_folder_prefix() -> String {
    DEFAULT_FOLDER_PREFIX.to_string()
}

fn default_label_count() -> usize {
    DEFAULT_LABEL_COUNT
}

fn default_files_per_label() -> usize {
    DEFAULT_FILES_PER_LABEL
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

impl GeneratorConfig {
    /// The stock deployment layout: `extracted_images-1/`, `Student_Dataset/` and
    /// `numbers.csv` side by side under `base`.
    pub fn v0(base: &Path) -> Self {
        Self {
            source_root: base.join("extracted_images-1"),
            output_root: base.join("Student_Dataset"),
            identifier_log: base.join("numbers.csv"),
            folder_prefix: default_folder_prefix(),
            label_count: DEFAULT_LABEL_COUNT,
            files_per_label: DEFAULT_FILES_PER_LABEL,
            vocabulary: VocabularySpec::default(),
            empty_pool: EmptyPoolPolicy::default(),
            log_failure: LogFailurePolicy::default(),
            time_zone: default_time_zone(),
            utc_offset_minutes: None,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let f = fs::File::open(path)?;
        let config: GeneratorConfig = serde_json::from_reader(f)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label_count == 0 {
            return Err(ConfigError::ZeroCount { field: "label_count" });
        }
        if self.files_per_label == 0 {
            return Err(ConfigError::ZeroCount { field: "files_per_label" });
        }
        if !is_path_component(&self.folder_prefix) {
            return Err(ConfigError::InvalidFolderPrefix(self.folder_prefix.clone()));
        }
        self.log_time_zone()?;

        let vocabulary = self.vocabulary()?;
        if vocabulary.len() < self.label_count {
            return Err(ConfigError::LabelCountExceedsVocabulary {
                label_count: self.label_count,
                vocabulary_size: vocabulary.len(),
            });
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> Result<Vocabulary, ConfigError> {
        Ok(self.vocabulary.resolve()?)
    }

    pub fn log_time_zone(&self) -> Result<LogTimeZone, ConfigError> {
        if let Some(minutes) = self.utc_offset_minutes {
            return minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(LogTimeZone::Fixed)
                .ok_or(ConfigError::InvalidUtcOffset(minutes));
        }

        self.time_zone
            .parse::<Tz>()
            .map(LogTimeZone::Named)
            .map_err(|_| ConfigError::UnknownTimeZone(self.time_zone.clone()))
    }
}
