//! Error types for receiver optimisation.
//!
//! ```text
//! ReceiverError
//! ├── CodewordError  (codeword construction, cutoff too small)
//! ├── PhotonicError  (circuit construction, backend execution)
//! └── ConfigError    (configuration validation / file loading)
//! ```

use std::path::PathBuf;

use codeword::CodewordError;
use photonic::PhotonicError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReceiverError>;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("codeword error: {0}")]
    Codeword(#[from] CodewordError),

    #[error("simulation error: {0}")]
    Photonic(#[from] PhotonicError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sampling needs at least one shot")]
    ZeroShots,

    #[error("cannot score an empty batch")]
    EmptyBatch,

    /// Only single-mode, single-layer receivers are optimised.
    #[error("optimisation is only available for one mode and one layer, got {modes} modes and {layers} layers")]
    UnsupportedArchitecture { modes: usize, layers: usize },

    #[error("circuit has {expected} parameters but {actual} values were supplied")]
    ParameterCount { expected: usize, actual: usize },

    #[error("circuit measures {expected} modes but the output codeword has {actual} symbols")]
    CodewordSize { expected: usize, actual: usize },

    /// The backend returned the wrong kind of output for the requested shots.
    #[error("backend returned {0}")]
    UnexpectedOutput(&'static str),
}

/// Errors produced when loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot read config file `{}`: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
