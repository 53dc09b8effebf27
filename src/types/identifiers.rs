use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Seeds are always reduced into `[0, SEED_MODULUS)`.
pub const SEED_MODULUS: u64 = 100_000_000;

/// A caller-supplied integer-like identifier.
///
/// Stored in canonical decimal form: no sign for non-negative values, no
/// leading zeros, `-0` folded into `0`. Any length is accepted, so values
/// wider than 64 bits round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier is empty")]
    Empty,
    #[error("Identifier must be an integer, got {0:?}")]
    NotAnInteger(String),
}

impl Identifier {
    /// Parse an identifier from caller text.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let (negative, digits) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::NotAnInteger(raw.to_string()));
        }

        let significant = digits.trim_start_matches('0');
        let canonical = match (negative, significant.is_empty()) {
            (_, true) => "0".to_string(),
            (true, false) => format!("-{significant}"),
            (false, false) => significant.to_string(),
        };

        Ok(Identifier(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex-encoded SHA-256 of the canonical decimal form.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identifier::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

macro_rules! identifier_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Identifier {
                fn from(value: $t) -> Self {
                    // Integer Display output is already canonical.
                    Identifier(value.to_string())
                }
            }
        )*
    };
}

identifier_from_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Deterministic generator seed derived from an [`Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(u64);

impl Seed {
    /// First 16 hex digits of the identifier's SHA-256, modulo 10^8.
    pub fn from_identifier(identifier: &Identifier) -> Self {
        let digest = Sha256::digest(identifier.as_str().as_bytes());

        // 16 hex digits are exactly the first 8 digest bytes, big-endian.
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);

        Seed(u64::from_be_bytes(prefix) % SEED_MODULUS)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
