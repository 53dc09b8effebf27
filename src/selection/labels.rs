use crate::selection::{draw_indices, SelectionError};
use crate::types::identifiers::Seed;
use crate::types::vocabulary::Vocabulary;

/// Picks a fixed number of distinct labels from a vocabulary.
#[derive(Debug, Clone)]
pub struct LabelSelector {
    vocabulary: Vocabulary,
    count: usize,
}

impl LabelSelector {
    pub fn new(vocabulary: Vocabulary, count: usize) -> Self {
        Self { vocabulary, count }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Labels in draw order. Same seed, same labels, same order.
    pub fn select(&self, seed: Seed) -> Result<Vec<String>, SelectionError> {
        if self.vocabulary.len() < self.count {
            return Err(SelectionError::VocabularyTooSmall {
                required: self.count,
                available: self.vocabulary.len(),
            });
        }

        let labels = draw_indices(seed, self.vocabulary.len(), self.count)
            .into_iter()
            .map(|i| self.vocabulary.labels()[i].clone())
            .collect();

        Ok(labels)
    }
}
