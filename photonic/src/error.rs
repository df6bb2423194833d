use thiserror::Error;

/// Errors raised while building or simulating an optical circuit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhotonicError {
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("unknown backend '{0}', expected one of fock, gaussian, autodiff")]
    UnknownBackend(String),

    #[error("unknown measuring type '{0}', expected probabilities or sampling")]
    UnknownMeasuringType(String),

    #[error("cutoff dimension must be at least 1")]
    InvalidCutoff,

    #[error("no value bound to circuit parameter '{0}'")]
    MissingParameter(String),

    #[error("program has already been run; reset the backend before running again")]
    DirtyContext,

    #[error("shots were requested from a program without a Fock measurement")]
    NoMeasurement,
}
