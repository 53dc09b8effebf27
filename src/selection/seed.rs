use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::{IdentifierLog, LogError};
use crate::config::LogFailurePolicy;
use crate::types::identifiers::{Identifier, Seed};
use crate::types::kind::ErrorKind;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Identifier could not be recorded: {0}")]
    LogFailed(#[from] LogError),
}

impl SeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SeedError::LogFailed(e) => e.kind(),
        }
    }
}

/// Outcome of one derivation.
#[derive(Debug)]
pub struct SeedDerivation {
    pub seed: Seed,
    /// Set when recording failed under [`LogFailurePolicy::Warn`].
    pub log_error: Option<LogError>,
}

/// Turns identifiers into seeds, recording each identifier exactly once per call.
#[derive(Debug)]
pub struct SeedDeriver {
    log: IdentifierLog,
    policy: LogFailurePolicy,
}

impl SeedDeriver {
    pub fn new(log: IdentifierLog, policy: LogFailurePolicy) -> Self {
        Self { log, policy }
    }

    pub fn log(&self) -> &IdentifierLog {
        &self.log
    }

    pub fn derive(&self, identifier: &Identifier) -> Result<SeedDerivation, SeedError> {
        let log_error = match (self.log.record(identifier), self.policy) {
            (Ok(()), _) => None,
            (Err(e), LogFailurePolicy::Fail) => return Err(e.into()),
            (Err(e), LogFailurePolicy::Warn) => {
                warn!(identifier = %identifier, error = %e, "identifier log write failed; continuing");
                Some(e)
            }
        };

        let seed = Seed::from_identifier(identifier);
        debug!(identifier = %identifier, seed = seed.value(), "seed derived");

        Ok(SeedDerivation { seed, log_error })
    }
}
