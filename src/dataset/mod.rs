pub mod archive;
pub mod manifest;
pub mod materializer;

pub use archive::{ArchiveBuilder, ArchiveError};
pub use manifest::{DatasetManifest, LabelSelection, MaterializedDataset};
pub use materializer::{DatasetMaterializer, MaterializeError};
