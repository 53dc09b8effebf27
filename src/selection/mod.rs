pub mod files;
pub mod labels;
pub mod seed;

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::types::identifiers::Seed;
use crate::types::kind::ErrorKind;

pub use files::FileSampler;
pub use labels::LabelSelector;
pub use seed::{SeedDerivation, SeedDeriver, SeedError};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Vocabulary has {available} labels, {required} required")]
    VocabularyTooSmall { required: usize, available: usize },

    #[error("Label {label} does not exist in the source corpus")]
    MissingLabel { label: String, path: PathBuf },

    #[error("Label {label} has no source files")]
    EmptySourcePool { label: String },

    #[error("File name under label {label} is not valid UTF-8: {name}")]
    NonUtf8FileName { label: String, name: String },

    #[error("Failed to list source files for label {label}: {source}")]
    Walk {
        label: String,
        #[source]
        source: walkdir::Error,
    },
}

impl SelectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SelectionError::VocabularyTooSmall { .. } => ErrorKind::InvalidInput,
            SelectionError::MissingLabel { .. } | SelectionError::EmptySourcePool { .. } => {
                ErrorKind::NotFound
            }
            SelectionError::NonUtf8FileName { .. } => ErrorKind::Unexpected,
            SelectionError::Walk { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Draw `amount` distinct indices from `0..len` in generator order.
///
/// Every call starts a fresh generator from `seed`, so two draws with the same
/// arguments always agree.
pub(crate) fn draw_indices(seed: Seed, len: usize, amount: usize) -> Vec<usize> {
    debug_assert!(amount <= len, "cannot draw {amount} of {len}");
    let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
    rand::seq::index::sample(&mut rng, len, amount).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn draw_is_distinct_in_range_and_repeatable() {
        let seed = Seed::from_identifier(&12345u32.into());
        let first = draw_indices(seed, 20, 10);
        let second = draw_indices(seed, 20, 10);

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert!(first.iter().all(|&i| i < 20));
        assert_eq!(first.iter().collect::<BTreeSet<_>>().len(), 10);
    }

    #[test]
    fn draw_everything_is_a_permutation() {
        let seed = Seed::from_identifier(&7u8.into());
        let mut all = draw_indices(seed, 5, 5);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = draw_indices(Seed::from_identifier(&1u8.into()), 1000, 50);
        let b = draw_indices(Seed::from_identifier(&2u8.into()), 1000, 50);
        assert_ne!(a, b);
    }
}
