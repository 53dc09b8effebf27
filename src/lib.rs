//! Deterministic per-identifier dataset generation.
//!
//! `dataset-forge` maps a numeric identifier to a seed, draws a fixed set of
//! labels and a fixed set of files per label from a source corpus, copies
//! them into a fresh directory, and packs that directory into a zip archive.
//! The same identifier reproduces the same selection on any machine, as long
//! as the source corpus is unchanged.

pub mod audit;
pub mod config;
pub mod dataset;
pub mod generator;
pub mod selection;
pub mod transport;
pub mod types;

pub use config::{EmptyPoolPolicy, GeneratorConfig, LogFailurePolicy};
pub use generator::{DatasetGenerator, GeneratedDataset, GeneratorError};
pub use types::{ErrorKind, Identifier, ResponseClass, Seed, Vocabulary};
