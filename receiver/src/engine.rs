//! Success probabilities of codeword hypotheses.
//!
//! An [`Engine`] binds a codeword and a parameter vector to a receiver circuit, runs it on its
//! backend and scores both hypotheses `[c, complement(c)]`, either from exact Fock
//! probabilities or from photon-counting shots.

use codeword::{all_codewords_from, fock_indices_for_all_codewords, Codeword, CodewordSuccessProbability};
use photonic::{
    Backend, BackendKind, BackendOptions, Bindings, Circuit, Dual, ExecutionContext, MeasuringType, RunOutput, Simulator,
};
use tracing::trace;

use crate::error::{ReceiverError, Result};

/// A hypothesis scored with a gradient-carrying probability.
pub type HypothesisProbability = CodewordSuccessProbability<Dual>;

/// Inputs of one engine evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EngineRunOptions<'a> {
    /// Tunable circuit parameters, bound after the input amplitudes.
    pub params: &'a [f64],
    /// Codeword whose amplitudes prepare the modes.
    pub input_codeword: &'a Codeword,
    /// Reference hypothesis; it and its complement are scored.
    pub output_codeword: &'a Codeword,
    pub shots: usize,
    pub measuring_type: MeasuringType,
}

/// How hypothesis probabilities are read from the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementStrategy {
    /// Sum exact Fock probabilities over each hypothesis' indices.
    ExactProbabilities,
    /// Estimate the vacuum probability of mode 0 from `shots` single-shot runs.
    Sampling { shots: usize },
}

impl MeasurementStrategy {
    /// # Errors
    ///
    /// Returns [`ReceiverError::ZeroShots`] when sampling with no shots.
    pub fn new(measuring_type: MeasuringType, shots: usize) -> Result<Self> {
        match measuring_type {
            MeasuringType::Probabilities => Ok(MeasurementStrategy::ExactProbabilities),
            MeasuringType::Sampling if shots == 0 => Err(ReceiverError::ZeroShots),
            MeasuringType::Sampling => Ok(MeasurementStrategy::Sampling { shots }),
        }
    }
}

/// Scores codeword hypotheses on a single backend.
///
/// The backend is reset before every run, so an engine can be called any number of times.
///
/// ```
/// use codeword::Codeword;
/// use photonic::{Architecture, BackendKind, BackendOptions, Circuit, MeasuringType};
/// use receiver::{Engine, EngineRunOptions};
///
/// let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
/// let mut engine = Engine::new(BackendKind::Fock, BackendOptions::default()).unwrap();
/// let reference = Codeword::reference(1, 0.7).unwrap();
/// let winner = engine
///     .run(&circuit, &EngineRunOptions {
///         params: &[-0.7],
///         input_codeword: &reference,
///         output_codeword: &reference,
///         shots: 0,
///         measuring_type: MeasuringType::Probabilities,
///     })
///     .unwrap();
/// assert_eq!(winner.codeword, reference);
/// ```
#[derive(Debug)]
pub struct Engine<B: Backend = Simulator> {
    backend: B,
    context: ExecutionContext,
}

impl Engine<Simulator> {
    /// # Errors
    ///
    /// Returns [`ReceiverError::Photonic`] when the backend options are invalid.
    pub fn new(kind: BackendKind, options: BackendOptions) -> Result<Self> {
        Ok(Engine::with_backend(Simulator::new(kind, options)?))
    }
}

impl<B: Backend> Engine<B> {
    pub fn with_backend(backend: B) -> Self {
        Engine {
            backend,
            context: ExecutionContext::Clean,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn cutoff_dim(&self) -> usize {
        self.backend.cutoff_dim()
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// The winning hypothesis: highest probability, the reference codeword on ties.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`Engine::codewords_success_probabilities`].
    pub fn run(&mut self, circuit: &Circuit, options: &EngineRunOptions<'_>) -> Result<HypothesisProbability> {
        let hypotheses = self.codewords_success_probabilities(circuit, options)?;
        max_probability_codeword(hypotheses).ok_or(ReceiverError::UnexpectedOutput("no hypotheses"))
    }

    /// Probabilities of both hypotheses, reference first.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::ParameterCount`] when the codeword and parameters do not fill
    /// the circuit, [`ReceiverError::CodewordSize`] when the output codeword does not have one
    /// symbol per mode, [`ReceiverError::ZeroShots`] when sampling without shots,
    /// [`ReceiverError::Codeword`] when the cutoff is smaller than the codeword, and
    /// [`ReceiverError::Photonic`] when the backend rejects the run.
    pub fn codewords_success_probabilities(
        &mut self,
        circuit: &Circuit,
        options: &EngineRunOptions<'_>,
    ) -> Result<Vec<HypothesisProbability>> {
        let bindings = self.bind_parameters(circuit, options)?;
        if options.output_codeword.size() != circuit.input_parameter_count() {
            return Err(ReceiverError::CodewordSize {
                expected: circuit.input_parameter_count(),
                actual: options.output_codeword.size(),
            });
        }
        match MeasurementStrategy::new(options.measuring_type, options.shots)? {
            MeasurementStrategy::ExactProbabilities => self.exact_probabilities(circuit, &bindings, options),
            MeasurementStrategy::Sampling { shots } => self.sampled_probabilities(circuit, &bindings, options, shots),
        }
    }

    /// Bind the input amplitudes, then the tunable parameters, in circuit parameter order.
    ///
    /// Tunable parameters become gradient variables when the backend is differentiable and
    /// the probabilities are exact.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::ParameterCount`] on a length mismatch.
    pub fn bind_parameters(&self, circuit: &Circuit, options: &EngineRunOptions<'_>) -> Result<Bindings> {
        let names = circuit.parameter_names();
        let supplied = options.input_codeword.size() + options.params.len();
        if supplied != names.len() || options.input_codeword.size() != circuit.input_parameter_count() {
            return Err(ReceiverError::ParameterCount {
                expected: names.len(),
                actual: supplied,
            });
        }

        let differentiable =
            self.backend.is_differentiable() && options.measuring_type == MeasuringType::Probabilities;
        let tunable = options.params.len();
        let inputs = options.input_codeword.word().iter().map(|&amplitude| Dual::constant(amplitude));
        let params = options.params.iter().enumerate().map(|(index, &value)| {
            if differentiable {
                Dual::variable(value, index, tunable)
            } else {
                Dual::constant(value)
            }
        });
        Ok(names.iter().cloned().zip(inputs.chain(params)).collect())
    }

    fn prepare_context(&mut self) {
        if self.context == ExecutionContext::Dirty || self.backend.is_dirty() {
            self.backend.reset();
            self.context = ExecutionContext::Clean;
        }
    }

    fn execute(&mut self, circuit: &Circuit, bindings: &Bindings, shots: usize) -> Result<RunOutput> {
        self.prepare_context();
        let output = self.backend.run(circuit, bindings, shots);
        self.context = ExecutionContext::Dirty;
        output.map_err(ReceiverError::from)
    }

    fn exact_probabilities(
        &mut self,
        circuit: &Circuit,
        bindings: &Bindings,
        options: &EngineRunOptions<'_>,
    ) -> Result<Vec<HypothesisProbability>> {
        let hypotheses = fock_indices_for_all_codewords(options.output_codeword, self.cutoff_dim())?;
        let RunOutput::State(state) = self.execute(circuit, bindings, 0)? else {
            return Err(ReceiverError::UnexpectedOutput("samples from a zero-shot run"));
        };
        let scored = hypotheses
            .into_iter()
            .map(|hypothesis| CodewordSuccessProbability {
                success_probability: hypothesis.indices.iter().map(|index| state.fock_prob(index)).sum(),
                codeword: hypothesis.codeword,
            })
            .collect();
        Ok(scored)
    }

    #[allow(clippy::cast_precision_loss)]
    fn sampled_probabilities(
        &mut self,
        circuit: &Circuit,
        bindings: &Bindings,
        options: &EngineRunOptions<'_>,
        shots: usize,
    ) -> Result<Vec<HypothesisProbability>> {
        let mut zeros = 0usize;
        for _ in 0..shots {
            let RunOutput::Samples(samples) = self.execute(circuit, bindings, 1)? else {
                return Err(ReceiverError::UnexpectedOutput("a state from a sampling run"));
            };
            if samples.first().and_then(|sample| sample.first()) == Some(&0) {
                zeros += 1;
            }
        }
        let vacuum = zeros as f64 / shots as f64;
        trace!(zeros, shots, "sampled vacuum rate");

        let [reference, complement] = all_codewords_from(options.output_codeword);
        Ok(vec![
            CodewordSuccessProbability {
                codeword: reference,
                success_probability: Dual::constant(vacuum),
            },
            CodewordSuccessProbability {
                codeword: complement,
                success_probability: Dual::constant(1.0 - vacuum),
            },
        ])
    }
}

/// The candidate with the strictly greatest probability; the first one wins ties.
pub fn max_probability_codeword<I>(candidates: I) -> Option<HypothesisProbability>
where
    I: IntoIterator<Item = HypothesisProbability>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(best) if candidate.success_probability.value() <= best.success_probability.value() => Some(best),
        _ => Some(candidate),
    })
}
