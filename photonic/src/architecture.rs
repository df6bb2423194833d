use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::PhotonicError;

/// Shape of the receiver circuit.
///
/// Every field has a default, so a partial description deserializes onto
/// [`Architecture::default`]:
///
/// ```
/// use photonic::Architecture;
///
/// let architecture: Architecture = serde_json::from_str(r#"{"squeezing": true}"#).unwrap();
/// assert_eq!(architecture.number_modes, 1);
/// assert!(architecture.displacement);
/// assert!(architecture.squeezing);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Architecture {
    pub number_modes: usize,
    pub number_layers: usize,
    pub displacement: bool,
    pub squeezing: bool,
    pub interferometer: bool,
}

impl Default for Architecture {
    fn default() -> Self {
        Architecture {
            number_modes: 1,
            number_layers: 1,
            displacement: true,
            squeezing: false,
            interferometer: false,
        }
    }
}

/// How the receiver reads the optical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasuringType {
    /// Read exact Fock probabilities from the simulated state.
    #[display("probabilities")]
    Probabilities,
    /// Estimate probabilities from repeated photon-counting shots.
    #[display("sampling")]
    Sampling,
}

impl FromStr for MeasuringType {
    type Err = PhotonicError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "probabilities" => Ok(MeasuringType::Probabilities),
            "sampling" => Ok(MeasuringType::Sampling),
            _ => Err(PhotonicError::UnknownMeasuringType(name.to_string())),
        }
    }
}

/// Which simulation backend evaluates the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum BackendKind {
    /// Fock basis truncated at the cutoff dimension.
    #[display("fock")]
    #[serde(rename = "fock")]
    Fock,
    /// Exact Gaussian-state probabilities, no truncation.
    #[display("gaussian")]
    #[serde(rename = "gaussian")]
    Gaussian,
    /// Truncated Fock basis with gradients flowing to the tunable parameters.
    #[display("autodiff")]
    #[serde(rename = "autodiff", alias = "tf")]
    Differentiable,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Fock, BackendKind::Gaussian, BackendKind::Differentiable];

    #[must_use]
    pub fn is_differentiable(self) -> bool {
        matches!(self, BackendKind::Differentiable)
    }

    /// True when the backend drops every Fock component at or above the cutoff dimension.
    #[must_use]
    pub fn truncates(self) -> bool {
        !matches!(self, BackendKind::Gaussian)
    }
}

impl FromStr for BackendKind {
    type Err = PhotonicError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fock" => Ok(BackendKind::Fock),
            "gaussian" => Ok(BackendKind::Gaussian),
            "autodiff" | "tf" => Ok(BackendKind::Differentiable),
            _ => Err(PhotonicError::UnknownBackend(name.to_string())),
        }
    }
}
