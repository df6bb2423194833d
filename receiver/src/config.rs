//! Optimisation settings.
//!
//! [`CsdConfiguration`] holds the defaults shared by every run of a [`crate::Csd`];
//! [`RunConfiguration`] picks the backend, the measuring type and the α values of one run and
//! may override some of those defaults. Both deserialize from JSON with every optional field
//! defaulted.

use std::path::Path;

use codeword::DEFAULT_ALPHA;
use photonic::{Architecture, BackendKind, MeasuringType};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReceiverError};

/// Optimiser and simulator defaults.
///
/// ```
/// use receiver::CsdConfiguration;
///
/// let config = CsdConfiguration::from_json_str(r#"{"steps": 300, "architecture": {"squeezing": true}}"#).unwrap();
/// assert_eq!(config.steps, 300);
/// assert_eq!(config.batch_size, 10);
/// assert!(config.architecture.displacement);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsdConfiguration {
    /// Adam updates per α on the differentiable backend; other backends take one step.
    pub steps: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub shots: usize,
    pub cutoff_dim: usize,
    pub architecture: Architecture,
    /// Seed for batches and shot sampling. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for CsdConfiguration {
    fn default() -> Self {
        CsdConfiguration {
            steps: 100,
            learning_rate: 0.1,
            batch_size: 10,
            shots: 100,
            cutoff_dim: 10,
            architecture: Architecture::default(),
            seed: None,
        }
    }
}

impl CsdConfiguration {
    /// Parse and validate a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::Json`] on malformed JSON and [`ReceiverError::Config`] when
    /// validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ReceiverError> {
        let config: CsdConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read, [`ConfigError::Parse`] if
    /// it is not valid JSON, and [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CsdConfiguration = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, returning the first problem found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero step count, batch size or cutoff, and for
    /// a learning rate that is not strictly positive. Zero shots are only rejected once a run
    /// asks for sampling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps == 0 {
            return Err(ConfigError::invalid_value("steps", "must be > 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::invalid_value(
                "learning_rate",
                format!("must be a positive number, got {}", self.learning_rate),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value("batch_size", "must be > 0"));
        }
        if self.cutoff_dim == 0 {
            return Err(ConfigError::invalid_value("cutoff_dim", "must be > 0"));
        }
        Ok(())
    }
}

/// One run: which backend, how to measure, and for which α values.
///
/// `backend` and `measuring_type` have no default, so a JSON description that omits either
/// fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    #[serde(default = "default_alphas")]
    pub alphas: Vec<f64>,
    pub backend: BackendKind,
    pub measuring_type: MeasuringType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
}

fn default_alphas() -> Vec<f64> {
    vec![DEFAULT_ALPHA]
}

impl RunConfiguration {
    #[must_use]
    pub fn new(backend: BackendKind, measuring_type: MeasuringType) -> Self {
        RunConfiguration {
            alphas: default_alphas(),
            backend,
            measuring_type,
            shots: None,
            batch_size: None,
            cutoff_dim: None,
            steps: None,
        }
    }

    #[must_use]
    pub fn with_alphas(mut self, alphas: impl Into<Vec<f64>>) -> Self {
        self.alphas = alphas.into();
        self
    }

    /// # Errors
    ///
    /// Returns [`ReceiverError::Json`] on malformed JSON or a missing `backend` /
    /// `measuring_type`.
    pub fn from_json_str(json: &str) -> Result<Self, ReceiverError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The effective settings of a run: the run's overrides applied to the shared configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunSettings {
    pub backend: BackendKind,
    pub measuring_type: MeasuringType,
    pub architecture: Architecture,
    pub learning_rate: f64,
    pub steps: usize,
    pub batch_size: usize,
    pub shots: usize,
    pub cutoff_dim: usize,
    pub seed: Option<u64>,
}

impl RunSettings {
    pub fn resolve(config: &CsdConfiguration, run: &RunConfiguration) -> Result<Self, ReceiverError> {
        let settings = RunSettings {
            backend: run.backend,
            measuring_type: run.measuring_type,
            architecture: config.architecture,
            learning_rate: config.learning_rate,
            steps: run.steps.unwrap_or(config.steps),
            batch_size: run.batch_size.unwrap_or(config.batch_size),
            shots: run.shots.unwrap_or(config.shots),
            cutoff_dim: run.cutoff_dim.unwrap_or(config.cutoff_dim),
            seed: config.seed,
        };
        if settings.architecture.number_modes != 1 || settings.architecture.number_layers != 1 {
            return Err(ReceiverError::UnsupportedArchitecture {
                modes: settings.architecture.number_modes,
                layers: settings.architecture.number_layers,
            });
        }
        if settings.batch_size == 0 {
            return Err(ReceiverError::EmptyBatch);
        }
        if settings.measuring_type == MeasuringType::Sampling && settings.shots == 0 {
            return Err(ReceiverError::ZeroShots);
        }
        if settings.steps == 0 {
            return Err(ConfigError::invalid_value("steps", "must be > 0").into());
        }
        if settings.cutoff_dim == 0 {
            return Err(ConfigError::invalid_value("cutoff_dim", "must be > 0").into());
        }
        Ok(settings)
    }

    /// Optimiser steps per α.
    pub fn learning_steps(&self) -> usize {
        if self.backend.is_differentiable() {
            self.steps
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CsdConfiguration::default().validate().is_ok());
    }

    #[test]
    fn config_fields_have_expected_defaults() {
        let config = CsdConfiguration::default();
        assert_eq!(config.steps, 100);
        assert!((config.learning_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.shots, 100);
        assert_eq!(config.cutoff_dim, 10);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let config = CsdConfiguration {
            batch_size: 0,
            ..CsdConfiguration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "batch_size", .. })
        ));
    }

    #[test]
    fn negative_learning_rate_is_invalid() {
        let config = CsdConfiguration {
            learning_rate: -0.1,
            ..CsdConfiguration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "learning_rate", .. })
        ));
    }

    #[test]
    fn run_without_backend_fails_to_parse() {
        let missing = RunConfiguration::from_json_str(r#"{"measuring_type": "probabilities"}"#);
        assert!(matches!(missing, Err(ReceiverError::Json(_))));
    }

    #[test]
    fn run_overrides_shared_settings() {
        let run = RunConfiguration::from_json_str(
            r#"{"alphas": [0.2, 0.4], "backend": "autodiff", "measuring_type": "sampling", "shots": 7, "steps": 3}"#,
        )
        .unwrap();
        assert_eq!(run.alphas, vec![0.2, 0.4]);
        let settings = RunSettings::resolve(&CsdConfiguration::default(), &run).unwrap();
        assert_eq!(settings.shots, 7);
        assert_eq!(settings.learning_steps(), 3);
        assert_eq!(settings.batch_size, 10);
    }

    #[test]
    fn non_differentiable_backends_take_one_step() {
        let run = RunConfiguration::new(BackendKind::Gaussian, MeasuringType::Probabilities);
        let settings = RunSettings::resolve(&CsdConfiguration::default(), &run).unwrap();
        assert_eq!(settings.learning_steps(), 1);
        assert_eq!(run.alphas, vec![DEFAULT_ALPHA]);
    }

    #[test]
    fn multi_layer_architecture_is_rejected() {
        let config = CsdConfiguration {
            architecture: Architecture {
                number_layers: 2,
                ..Architecture::default()
            },
            ..CsdConfiguration::default()
        };
        let run = RunConfiguration::new(BackendKind::Fock, MeasuringType::Probabilities);
        assert!(matches!(
            RunSettings::resolve(&config, &run),
            Err(ReceiverError::UnsupportedArchitecture { modes: 1, layers: 2 })
        ));
    }

    #[test]
    fn zero_shots_are_accepted_for_exact_probabilities() {
        let config = CsdConfiguration {
            shots: 0,
            ..CsdConfiguration::default()
        };
        assert!(config.validate().is_ok());
        let run = RunConfiguration::new(BackendKind::Fock, MeasuringType::Probabilities);
        assert_eq!(RunSettings::resolve(&config, &run).unwrap().shots, 0);
        let run = RunConfiguration::new(BackendKind::Fock, MeasuringType::Sampling);
        assert!(matches!(
            RunSettings::resolve(&config, &run),
            Err(ReceiverError::ZeroShots)
        ));
    }

    #[test]
    fn zero_shot_override_is_rejected_for_sampling() {
        let run = RunConfiguration {
            shots: Some(0),
            ..RunConfiguration::new(BackendKind::Fock, MeasuringType::Sampling)
        };
        assert!(matches!(
            RunSettings::resolve(&CsdConfiguration::default(), &run),
            Err(ReceiverError::ZeroShots)
        ));
    }
}
