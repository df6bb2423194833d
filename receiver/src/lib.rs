//! Optimisation of displacement receivers for binary coherent-state discrimination.
//!
//! A transmitter sends `+α` or `-α` on a single optical mode; the receiver displaces the mode,
//! optionally squeezes it, and counts photons. [`Csd`] tunes the receiver parameters for a
//! range of α values so that "no click" signals the reference symbol with the lowest error.

pub mod config;
pub mod csd;
pub mod engine;
pub mod error;
pub mod optimize;
pub mod result;

pub use config::{CsdConfiguration, RunConfiguration};
pub use csd::Csd;
pub use engine::{max_probability_codeword, Engine, EngineRunOptions, HypothesisProbability, MeasurementStrategy};
pub use error::{ConfigError, ReceiverError, Result};
pub use optimize::{Adam, Minimizer, NelderMead, Optimizer};
pub use result::{plot_label, AlphaOutcome, ResultExecution};
