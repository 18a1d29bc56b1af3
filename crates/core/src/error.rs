use std::io;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Rejected configuration, reported before any comparison runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("minimum token match must be >= 1 (got {value})")]
    MinimumTokenMatch { value: usize },

    #[error("similarity threshold must be within 0..1 (got {value})")]
    SimilarityThreshold { value: f64 },

    #[error("{name} must be within 0..1 (got {value})")]
    UnitInterval { name: &'static str, value: f64 },

    #[error("{name} must be a positive finite number (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be a non-negative finite number (got {value})")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be >= 1")]
    Zero { name: &'static str },

    #[error("spectral min runs ({min}) exceeds max runs ({max})")]
    RunRange { min: usize, max: usize },

    #[error("consumption mask covers {mask} positions but the sequence has {sequence}")]
    MaskLength { mask: usize, sequence: usize },

    #[error("unknown {kind} name: {name}")]
    UnknownName { kind: &'static str, name: String },
}

impl ConfigError {
    pub(crate) fn unknown(kind: &'static str, name: &str) -> Self {
        Self::UnknownName {
            kind,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("run aborted: timeout of {0:?} exceeded")]
    Timeout(Duration),

    #[error("duplicate submission name: {0}")]
    DuplicateSubmission(String),

    #[error("base code submission not found: {0}")]
    UnknownBaseCode(String),

    #[error("base code submission {0} could not be tokenized")]
    BaseCodeInvalid(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
