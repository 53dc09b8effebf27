use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASELINE: [&str; 20] = [
    "leq", "geq", "theta", "neq", "[", "]", "pm", "div", "!", "beta", "pi", "alpha", "sum",
    "times", "sqrt", "=", "(", ")", "+", "-",
];

const EXTENDED: [&str; 66] = [
    "!", "(", ")", "+", ",", "-", "=", "[", "]", "{", "}", "div", "times", "pm", "sqrt", "sum",
    "int", "neq", "leq", "geq", "lt", "gt", "ldots", "forward_slash", "ascii_124", "rightarrow",
    "infty", "exists", "forall", "in", "prime", "lim", "log", "sin", "cos", "tan", "alpha",
    "beta", "gamma", "Delta", "lambda", "mu", "phi", "pi", "sigma", "theta", "0", "1", "2", "3",
    "4", "5", "6", "7", "8", "9", "A", "b", "C", "d", "e", "f", "G", "H", "i", "j",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("Vocabulary is empty")]
    Empty,
    #[error("Duplicate label in vocabulary: {0}")]
    DuplicateLabel(String),
    #[error("Label is not a single path component: {0:?}")]
    InvalidLabel(String),
}

/// Which vocabulary a generator draws labels from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VocabularySpec {
    Named(VocabularyName),
    Custom(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyName {
    Baseline,
    Extended,
}

impl Default for VocabularySpec {
    fn default() -> Self {
        VocabularySpec::Named(VocabularyName::Baseline)
    }
}

impl VocabularySpec {
    pub fn resolve(&self) -> Result<Vocabulary, VocabularyError> {
        match self {
            VocabularySpec::Named(VocabularyName::Baseline) => Ok(Vocabulary::baseline()),
            VocabularySpec::Named(VocabularyName::Extended) => Ok(Vocabulary::extended()),
            VocabularySpec::Custom(labels) => Vocabulary::custom(labels.clone()),
        }
    }
}

/// Ordered, duplicate-free set of labels. Order matters: selection draws
/// indices into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    /// The 20-label symbol set.
    pub fn baseline() -> Self {
        Self::from_static(&BASELINE)
    }

    /// The 66-label symbol set (a superset of [`Vocabulary::baseline`]).
    pub fn extended() -> Self {
        Self::from_static(&EXTENDED)
    }

    pub fn custom(labels: Vec<String>) -> Result<Self, VocabularyError> {
        if labels.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let mut seen = BTreeSet::new();
        for label in &labels {
            if !is_path_component(label) {
                return Err(VocabularyError::InvalidLabel(label.clone()));
            }
            if !seen.insert(label.as_str()) {
                return Err(VocabularyError::DuplicateLabel(label.clone()));
            }
        }

        Ok(Self { labels })
    }

    fn from_static(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// A label doubles as a directory name under the source and output roots.
pub(crate) fn is_path_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_vocabularies_are_valid() {
        let baseline = Vocabulary::baseline();
        let extended = Vocabulary::extended();
        assert_eq!(baseline.len(), 20);
        assert_eq!(extended.len(), 66);

        assert!(Vocabulary::custom(baseline.labels().to_vec()).is_ok());
        assert!(Vocabulary::custom(extended.labels().to_vec()).is_ok());
    }

    #[test]
    fn extended_contains_every_baseline_label() {
        let extended = Vocabulary::extended();
        for label in Vocabulary::baseline().labels() {
            assert!(extended.labels().contains(label), "missing {label}");
        }
    }

    #[test]
    fn custom_rejects_bad_input() {
        assert_eq!(Vocabulary::custom(vec![]), Err(VocabularyError::Empty));
        assert_eq!(
            Vocabulary::custom(vec!["a".into(), "a".into()]),
            Err(VocabularyError::DuplicateLabel("a".into()))
        );
        assert_eq!(
            Vocabulary::custom(vec!["../etc".into()]),
            Err(VocabularyError::InvalidLabel("../etc".into()))
        );
        assert_eq!(
            Vocabulary::custom(vec!["..".into()]),
            Err(VocabularyError::InvalidLabel("..".into()))
        );
    }

    #[test]
    fn spec_deserializes_names_and_lists() {
        let named: VocabularySpec = serde_json::from_str("\"extended\"").unwrap();
        assert_eq!(named, VocabularySpec::Named(VocabularyName::Extended));

        let custom: VocabularySpec = serde_json::from_str(r#"["x", "y"]"#).unwrap();
        assert_eq!(custom.resolve().unwrap().len(), 2);
    }
}
