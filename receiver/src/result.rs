use std::io::Write;

use photonic::{BackendKind, MeasuringType};
use serde::Serialize;

use crate::error::Result;

/// Curve label used when plotting the success probability of a run.
#[must_use]
pub fn plot_label(backend: BackendKind, measuring_type: MeasuringType) -> &'static str {
    match (backend, measuring_type) {
        (BackendKind::Fock, MeasuringType::Probabilities) => "pFockProb(a)",
        (BackendKind::Gaussian, MeasuringType::Probabilities) => "pGausProb(a)",
        (BackendKind::Differentiable, MeasuringType::Probabilities) => "pDiffProb(a)",
        (BackendKind::Fock, MeasuringType::Sampling) => "pFockSampl(a)",
        (BackendKind::Gaussian, MeasuringType::Sampling) => "pGausSampl(a)",
        (BackendKind::Differentiable, MeasuringType::Sampling) => "pDiffSampl(a)",
    }
}

/// The optimised receiver for one α.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlphaOutcome {
    /// α rounded to two decimals.
    pub alpha: f64,
    /// Transmitted amplitudes of the last batch.
    pub batch: Vec<f64>,
    pub opt_params: Vec<f64>,
    pub p_err: f64,
    pub p_succ: f64,
}

/// Outcomes of one run, one entry per α in the order they were optimised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultExecution {
    pub backend: BackendKind,
    pub measuring_type: MeasuringType,
    pub plot_label: String,
    pub outcomes: Vec<AlphaOutcome>,
}

impl ResultExecution {
    #[must_use]
    pub fn new(backend: BackendKind, measuring_type: MeasuringType) -> Self {
        ResultExecution {
            backend,
            measuring_type,
            plot_label: plot_label(backend, measuring_type).to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: AlphaOutcome) {
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn alphas(&self) -> impl Iterator<Item = f64> + '_ {
        self.outcomes.iter().map(|outcome| outcome.alpha)
    }

    pub fn success_probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.outcomes.iter().map(|outcome| outcome.p_succ)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReceiverError::Json`] when writing fails.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
