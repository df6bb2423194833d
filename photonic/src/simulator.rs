use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::architecture::BackendKind;
use crate::circuit::{Bindings, Circuit, ModeId, Operation, Program};
use crate::dual::Dual;
use crate::error::PhotonicError;
use crate::sampling::PhotonCountSampler;
use crate::state::{FockState, ModeState};
use crate::Backend;

/// Photon counts of one shot, in the order the measurement lists its modes.
pub type Sample = SmallVec<[usize; 4]>;

/// Settings shared by every [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    pub cutoff_dim: usize,
    /// Seed for shot sampling; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            cutoff_dim: 10,
            seed: None,
        }
    }
}

/// Result of one program execution.
#[derive(Debug, Clone)]
pub enum RunOutput {
    /// Zero-shot run: the final state.
    State(FockState),
    /// One entry per shot.
    Samples(Vec<Sample>),
}

impl RunOutput {
    #[must_use]
    pub fn state(&self) -> Option<&FockState> {
        match self {
            RunOutput::State(state) => Some(state),
            RunOutput::Samples(_) => None,
        }
    }

    #[must_use]
    pub fn samples(&self) -> Option<&[Sample]> {
        match self {
            RunOutput::State(_) => None,
            RunOutput::Samples(samples) => Some(samples),
        }
    }
}

/// Whether the simulator still holds the effects of a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    #[default]
    Clean,
    Dirty,
}

/// Product-state simulator for receiver circuits.
///
/// One type covers every [`BackendKind`]: the kinds differ only in whether Fock components at or
/// above the cutoff are kept, and whether callers seed gradients through the bindings.
///
/// ```
/// use photonic::{Architecture, Backend, BackendKind, BackendOptions, Bindings, Circuit, Dual, MeasuringType, Simulator};
///
/// let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
/// let bindings: Bindings = [("alpha_0", Dual::constant(0.7)), ("beta_0_0", Dual::constant(-0.7))]
///     .into_iter()
///     .collect();
/// let mut simulator = Simulator::new(BackendKind::Fock, BackendOptions::default()).unwrap();
/// let output = simulator.run(&circuit, &bindings, 0).unwrap();
/// let state = output.state().unwrap();
/// assert!((state.fock_prob(&[0]).value() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    kind: BackendKind,
    cutoff_dim: usize,
    rng: SmallRng,
    context: ExecutionContext,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns [`PhotonicError::InvalidCutoff`] when `options.cutoff_dim` is zero.
    pub fn new(kind: BackendKind, options: BackendOptions) -> Result<Self, PhotonicError> {
        if options.cutoff_dim == 0 {
            return Err(PhotonicError::InvalidCutoff);
        }
        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Simulator {
            kind,
            cutoff_dim: options.cutoff_dim,
            rng,
            context: ExecutionContext::Clean,
        })
    }

    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    fn truncation(&self) -> Option<usize> {
        self.kind.truncates().then_some(self.cutoff_dim)
    }

    fn evolve(program: &Program, bindings: &Bindings) -> Result<Vec<ModeState>, PhotonicError> {
        let mut modes = vec![ModeState::vacuum(); program.mode_count()];
        for operation in program {
            match operation {
                Operation::Coherent { mode, parameter } => {
                    modes[*mode] = ModeState::coherent(lookup(bindings, parameter)?.clone());
                }
                Operation::Displace { mode, parameter } => modes[*mode].displace(lookup(bindings, parameter)?),
                Operation::Squeeze { mode, parameter } => modes[*mode].squeeze(lookup(bindings, parameter)?),
                Operation::MeasureFock { .. } => {}
            }
        }
        Ok(modes)
    }

    fn measured_modes(program: &Program) -> SmallVec<[ModeId; 4]> {
        program
            .iter()
            .find_map(|operation| match operation {
                Operation::MeasureFock { modes } => Some(modes.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn sample(&mut self, modes: &[ModeState], measured: &[ModeId], shots: usize) -> Vec<Sample> {
        let truncation = self.truncation();
        let samplers: SmallVec<[PhotonCountSampler; 4]> = measured
            .iter()
            .map(|&mode| PhotonCountSampler::new(&modes[mode], truncation))
            .collect();
        (0..shots)
            .map(|_| samplers.iter().map(|sampler| sampler.sample(&mut self.rng)).collect())
            .collect()
    }
}

fn lookup<'a>(bindings: &'a Bindings, parameter: &str) -> Result<&'a Dual, PhotonicError> {
    bindings
        .get(parameter)
        .ok_or_else(|| PhotonicError::MissingParameter(parameter.to_string()))
}

impl Backend for Simulator {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn cutoff_dim(&self) -> usize {
        self.cutoff_dim
    }

    fn is_dirty(&self) -> bool {
        self.context == ExecutionContext::Dirty
    }

    fn reset(&mut self) {
        self.context = ExecutionContext::Clean;
    }

    fn run(&mut self, circuit: &Circuit, bindings: &Bindings, shots: usize) -> Result<RunOutput, PhotonicError> {
        if self.is_dirty() {
            return Err(PhotonicError::DirtyContext);
        }
        let program = circuit.program();
        if shots > 0 && !program.measures() {
            return Err(PhotonicError::NoMeasurement);
        }

        let modes = Self::evolve(program, bindings)?;
        self.context = ExecutionContext::Dirty;
        trace!(backend = %self.kind, modes = modes.len(), shots, "ran receiver program");

        if shots == 0 {
            return Ok(RunOutput::State(FockState::new(
                modes,
                self.cutoff_dim,
                self.kind.truncates(),
            )));
        }
        let measured = Self::measured_modes(program);
        Ok(RunOutput::Samples(self.sample(&modes, &measured, shots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::{Architecture, MeasuringType};
    use crate::statistical_testing::{assert_histogram, SMALL_RUN_MARGIN};

    fn bindings(alpha: f64, beta: f64) -> Bindings {
        [("alpha_0", Dual::constant(alpha)), ("beta_0_0", Dual::constant(beta))]
            .into_iter()
            .collect()
    }

    fn simulator(kind: BackendKind, cutoff_dim: usize) -> Simulator {
        Simulator::new(kind, BackendOptions { cutoff_dim, seed: Some(42) }).unwrap()
    }

    #[test]
    fn zero_cutoff_is_rejected() {
        let options = BackendOptions {
            cutoff_dim: 0,
            seed: None,
        };
        assert_eq!(
            Simulator::new(BackendKind::Fock, options).unwrap_err(),
            PhotonicError::InvalidCutoff
        );
    }

    #[test]
    fn second_run_needs_a_reset() {
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
        let mut simulator = simulator(BackendKind::Fock, 5);
        simulator.run(&circuit, &bindings(0.7, 0.0), 0).unwrap();
        assert!(simulator.is_dirty());
        assert_eq!(
            simulator.run(&circuit, &bindings(0.7, 0.0), 0).unwrap_err(),
            PhotonicError::DirtyContext
        );
        simulator.reset();
        assert_eq!(simulator.context(), ExecutionContext::Clean);
        assert!(simulator.run(&circuit, &bindings(0.7, 0.0), 0).is_ok());
    }

    #[test]
    fn unbound_parameter_leaves_context_clean() {
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
        let mut simulator = simulator(BackendKind::Gaussian, 5);
        let partial: Bindings = [("alpha_0", Dual::constant(0.7))].into_iter().collect();
        assert_eq!(
            simulator.run(&circuit, &partial, 0).unwrap_err(),
            PhotonicError::MissingParameter("beta_0_0".to_string())
        );
        assert!(!simulator.is_dirty());
    }

    #[test]
    fn shots_need_a_measurement() {
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
        let mut simulator = simulator(BackendKind::Fock, 5);
        assert_eq!(
            simulator.run(&circuit, &bindings(0.7, 0.0), 1).unwrap_err(),
            PhotonicError::NoMeasurement
        );
    }

    #[test]
    fn gaussian_backend_is_not_truncated() {
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
        let mut fock = simulator(BackendKind::Fock, 2);
        let mut gaussian = simulator(BackendKind::Gaussian, 2);
        let fock_state = fock.run(&circuit, &bindings(1.0, 0.0), 0).unwrap();
        let gaussian_state = gaussian.run(&circuit, &bindings(1.0, 0.0), 0).unwrap();
        assert_eq!(fock_state.state().unwrap().fock_prob(&[3]).value(), 0.0);
        assert!(gaussian_state.state().unwrap().fock_prob(&[3]).value() > 0.06);
    }

    #[test]
    fn sampled_counts_follow_the_photon_distribution() {
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Sampling).unwrap();
        let mut simulator = simulator(BackendKind::Gaussian, 10);
        let shots = 50_000;
        let output = simulator.run(&circuit, &bindings(0.6, 0.4), shots).unwrap();
        let samples = output.samples().unwrap();
        assert_eq!(samples.len(), shots);

        let mut counts = [0usize; 3];
        for sample in samples {
            assert_eq!(sample.len(), 1);
            if let Some(count) = counts.get_mut(sample[0]) {
                *count += 1;
            }
        }
        // Displacing 0.6 by 0.4 leaves the coherent state |1.0⟩; compare the first three counts.
        let head: Vec<f64> = ModeState::coherent(Dual::constant(1.0))
            .probabilities(3)
            .iter()
            .map(Dual::value)
            .collect();
        let mass: f64 = head.iter().sum();
        let expected: Vec<f64> = head.iter().map(|p| p / mass).collect();
        assert_histogram(&counts, &expected, SMALL_RUN_MARGIN, "coherent 1.0");
    }
}
