pub mod identifiers;
pub mod kind;
pub mod vocabulary;

pub use identifiers::{Identifier, IdentifierError, Seed, SEED_MODULUS};
pub use kind::{ErrorKind, ResponseClass};
pub use vocabulary::{Vocabulary, VocabularyError, VocabularyName, VocabularySpec};
