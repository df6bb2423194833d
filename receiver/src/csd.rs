//! The per-α optimisation driver.
//!
//! For every α a fresh circuit, engine and optimiser are built; each optimisation step draws a
//! random batch of codewords, scores the receiver on it and lets the minimiser update the
//! tunable parameters. α values share nothing, so [`Csd::execute_parallel`] fans them out with
//! rayon.

use std::time::Instant;

use codeword::Codeword;
use photonic::{BackendKind, BackendOptions, Circuit, Dual, MeasuringType};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{CsdConfiguration, RunConfiguration, RunSettings};
use crate::engine::{Engine, EngineRunOptions};
use crate::error::{ReceiverError, Result};
use crate::optimize::{Minimizer, Optimizer};
use crate::result::{AlphaOutcome, ResultExecution};

/// Steps between parameter logs on the differentiable backend.
const LOG_EVERY_STEPS: usize = 100;

/// Coherent-state discrimination experiments sharing one configuration.
///
/// ```
/// use photonic::{BackendKind, MeasuringType};
/// use receiver::{Csd, CsdConfiguration, RunConfiguration};
///
/// let csd = Csd::new(CsdConfiguration { seed: Some(1), ..CsdConfiguration::default() }).unwrap();
/// let run = RunConfiguration::new(BackendKind::Fock, MeasuringType::Probabilities).with_alphas([0.4, 0.8]);
/// let result = csd.execute(&run).unwrap();
/// assert_eq!(result.len(), 2);
/// assert_eq!(result.plot_label, "pFockProb(a)");
/// ```
#[derive(Debug, Clone)]
pub struct Csd {
    config: CsdConfiguration,
}

impl Csd {
    /// # Errors
    ///
    /// Returns [`ReceiverError::Config`] when `config` fails validation.
    pub fn new(config: CsdConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Csd { config })
    }

    #[must_use]
    pub fn config(&self) -> &CsdConfiguration {
        &self.config
    }

    /// Optimise the receiver for every α of `run`, one after the other.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported architecture, invalid settings, or the first α whose
    /// optimisation fails.
    pub fn execute(&self, run: &RunConfiguration) -> Result<ResultExecution> {
        let mut result = ResultExecution::new(run.backend, run.measuring_type);
        self.execute_into(run, &mut result)?;
        Ok(result)
    }

    /// Like [`Csd::execute`], appending to `result`.
    ///
    /// Outcomes appended before a failing α are kept.
    ///
    /// # Errors
    ///
    /// See [`Csd::execute`].
    pub fn execute_into(&self, run: &RunConfiguration, result: &mut ResultExecution) -> Result<()> {
        let settings = RunSettings::resolve(&self.config, run)?;
        let start = Instant::now();
        debug!(
            backend = %settings.backend,
            measuring_type = %settings.measuring_type,
            cutoff_dim = settings.cutoff_dim,
            "executing one layer circuit"
        );

        for (index, &alpha) in run.alphas.iter().enumerate() {
            let outcome = AlphaOptimization::new(&settings, alpha, alpha_rng(settings.seed, index))?.run()?;
            result.push(outcome);
        }

        info!(
            backend = %settings.backend,
            measuring_type = %settings.measuring_type,
            alphas = run.alphas.len(),
            elapsed = ?start.elapsed(),
            "execution finished"
        );
        Ok(())
    }

    /// Optimise every α of `run` concurrently.
    ///
    /// With a seeded configuration the outcomes equal those of [`Csd::execute`]. Outcomes are
    /// returned in input order; any failure discards the whole run.
    ///
    /// # Errors
    ///
    /// See [`Csd::execute`].
    pub fn execute_parallel(&self, run: &RunConfiguration) -> Result<ResultExecution> {
        let settings = RunSettings::resolve(&self.config, run)?;
        let start = Instant::now();

        let outcomes = run
            .alphas
            .par_iter()
            .enumerate()
            .map(|(index, &alpha)| AlphaOptimization::new(&settings, alpha, alpha_rng(settings.seed, index))?.run())
            .collect::<Result<Vec<AlphaOutcome>>>()?;

        let mut result = ResultExecution::new(run.backend, run.measuring_type);
        result.outcomes = outcomes;
        info!(
            backend = %settings.backend,
            measuring_type = %settings.measuring_type,
            alphas = run.alphas.len(),
            elapsed = ?start.elapsed(),
            "parallel execution finished"
        );
        Ok(result)
    }

    /// Run every backend for each requested measuring type, probabilities first.
    ///
    /// # Errors
    ///
    /// Stops at the first failing run.
    pub fn execute_all_backends_and_measuring_types(
        &self,
        alphas: &[f64],
        backends: &[BackendKind],
        measuring_types: &[MeasuringType],
    ) -> Result<Vec<ResultExecution>> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(backends.len() * measuring_types.len());
        for measuring_type in [MeasuringType::Probabilities, MeasuringType::Sampling] {
            if !measuring_types.contains(&measuring_type) {
                continue;
            }
            for &backend in backends {
                let run = RunConfiguration::new(backend, measuring_type).with_alphas(alphas);
                results.push(self.execute(&run)?);
            }
        }
        info!(runs = results.len(), elapsed = ?start.elapsed(), "all backends finished");
        Ok(results)
    }
}

fn alpha_rng(seed: Option<u64>, index: usize) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => SmallRng::from_entropy(),
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Where an [`AlphaOptimization`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlphaStage {
    /// Circuit and engine built, no step taken.
    Ready,
    StepLoop { completed: usize },
    Done,
}

/// Optimisation of the receiver for a single α.
pub(crate) struct AlphaOptimization<'a> {
    settings: &'a RunSettings,
    alpha: f64,
    reference: Codeword,
    circuit: Circuit,
    engine: Engine,
    optimizer: Optimizer,
    rng: SmallRng,
    params: Vec<f64>,
    batch: Vec<Codeword>,
    stage: AlphaStage,
}

impl<'a> AlphaOptimization<'a> {
    pub fn new(settings: &'a RunSettings, alpha: f64, mut rng: SmallRng) -> Result<Self> {
        let modes = settings.architecture.number_modes;
        let reference = Codeword::reference(modes, alpha)?;
        let circuit = Circuit::new(&settings.architecture, settings.measuring_type)?;
        let options = BackendOptions {
            cutoff_dim: settings.cutoff_dim,
            seed: Some(rng.gen()),
        };
        let engine = Engine::new(settings.backend, options)?;
        let params = vec![0.0; circuit.tunable_parameter_count()];
        debug!(alpha = round_to_hundredths(alpha), "optimizing");

        Ok(AlphaOptimization {
            settings,
            alpha,
            reference,
            circuit,
            engine,
            optimizer: Optimizer::for_backend(settings.backend, settings.learning_rate),
            rng,
            params,
            batch: Vec::new(),
            stage: AlphaStage::Ready,
        })
    }

    /// Draw a fresh batch and let the optimiser update the parameters once.
    pub fn step(&mut self) -> Result<()> {
        let completed = match self.stage {
            AlphaStage::Ready => 0,
            AlphaStage::StepLoop { completed } => completed,
            AlphaStage::Done => return Ok(()),
        };

        self.batch = (0..self.settings.batch_size)
            .map(|_| Codeword::random(self.reference.size(), self.alpha, &mut self.rng))
            .collect::<std::result::Result<_, _>>()?;

        let scorer = BatchScorer {
            circuit: &self.circuit,
            reference: &self.reference,
            batch: &self.batch,
            shots: self.settings.shots,
            measuring_type: self.settings.measuring_type,
        };
        let engine = &mut self.engine;
        self.params = self
            .optimizer
            .minimize(|params| scorer.error_probability(engine, params), &self.params)?;

        let completed = completed + 1;
        self.stage = AlphaStage::StepLoop { completed };
        if self.settings.backend.is_differentiable() && completed % LOG_EVERY_STEPS == 0 {
            debug!(step = completed, params = ?self.params, "learned parameters");
        }
        Ok(())
    }

    /// Score the current parameters on the last batch and record the outcome.
    pub fn finish(mut self) -> Result<AlphaOutcome> {
        if self.batch.is_empty() {
            return Err(ReceiverError::EmptyBatch);
        }
        let scorer = BatchScorer {
            circuit: &self.circuit,
            reference: &self.reference,
            batch: &self.batch,
            shots: self.settings.shots,
            measuring_type: self.settings.measuring_type,
        };
        let p_err = scorer.error_probability(&mut self.engine, &self.params)?.value();
        self.stage = AlphaStage::Done;

        let alpha = round_to_hundredths(self.alpha);
        debug!(alpha, params = ?self.params, p_succ = 1.0 - p_err, "optimized");
        Ok(AlphaOutcome {
            alpha,
            batch: self.batch.iter().flat_map(|codeword| codeword.word().iter().copied()).collect(),
            opt_params: self.params,
            p_err,
            p_succ: 1.0 - p_err,
        })
    }

    pub fn run(mut self) -> Result<AlphaOutcome> {
        for _ in 0..self.settings.learning_steps() {
            self.step()?;
        }
        self.finish()
    }
}

/// Average error probability of a receiver over a batch.
struct BatchScorer<'a> {
    circuit: &'a Circuit,
    reference: &'a Codeword,
    batch: &'a [Codeword],
    shots: usize,
    measuring_type: MeasuringType,
}

impl BatchScorer<'_> {
    /// A reference symbol is misread on a click, any other symbol on no click.
    #[allow(clippy::cast_precision_loss)]
    fn error_probability(&self, engine: &mut Engine, params: &[f64]) -> Result<Dual> {
        if self.batch.is_empty() {
            return Err(ReceiverError::EmptyBatch);
        }
        let mut total = Dual::constant(0.0);
        for sample in self.batch {
            let options = EngineRunOptions {
                params,
                input_codeword: sample,
                output_codeword: self.reference,
                shots: self.shots,
                measuring_type: self.measuring_type,
            };
            let hypotheses = engine.codewords_success_probabilities(self.circuit, &options)?;
            let no_click = hypotheses
                .into_iter()
                .next()
                .map(|hypothesis| hypothesis.success_probability)
                .ok_or(ReceiverError::UnexpectedOutput("no hypotheses"))?;
            let error = if sample.is_reference() { 1.0 - no_click } else { no_click };
            total = total + error;
        }
        Ok(total / self.batch.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photonic::Architecture;

    fn settings(backend: BackendKind, measuring_type: MeasuringType) -> RunSettings {
        let config = CsdConfiguration {
            steps: 5,
            batch_size: 4,
            shots: 20,
            seed: Some(9),
            ..CsdConfiguration::default()
        };
        RunSettings::resolve(&config, &RunConfiguration::new(backend, measuring_type)).unwrap()
    }

    #[test]
    fn stages_advance_through_the_step_loop() {
        let settings = settings(BackendKind::Differentiable, MeasuringType::Probabilities);
        let mut optimization = AlphaOptimization::new(&settings, 0.7, alpha_rng(Some(1), 0)).unwrap();
        assert_eq!(optimization.stage, AlphaStage::Ready);
        assert_eq!(optimization.params, vec![0.0]);
        optimization.step().unwrap();
        optimization.step().unwrap();
        assert_eq!(optimization.stage, AlphaStage::StepLoop { completed: 2 });
        let outcome = optimization.finish().unwrap();
        assert_eq!(outcome.batch.len(), 4);
        assert!((outcome.p_err + outcome.p_succ - 1.0).abs() < 1e-12);
    }

    #[test]
    fn finishing_without_a_step_is_an_empty_batch() {
        let settings = settings(BackendKind::Fock, MeasuringType::Probabilities);
        let optimization = AlphaOptimization::new(&settings, 0.7, alpha_rng(Some(1), 0)).unwrap();
        assert!(matches!(optimization.finish(), Err(ReceiverError::EmptyBatch)));
    }

    #[test]
    fn nulling_receiver_only_errs_on_the_complement() {
        let settings = settings(BackendKind::Fock, MeasuringType::Probabilities);
        let reference = Codeword::reference(1, 0.7).unwrap();
        let batch = vec![reference.clone(), reference.complement()];
        let circuit = Circuit::new(&Architecture::default(), MeasuringType::Probabilities).unwrap();
        let scorer = BatchScorer {
            circuit: &circuit,
            reference: &reference,
            batch: &batch,
            shots: settings.shots,
            measuring_type: settings.measuring_type,
        };
        let mut engine = Engine::new(BackendKind::Fock, BackendOptions::default()).unwrap();
        let error = scorer.error_probability(&mut engine, &[-0.7]).unwrap();
        // The reference is displaced to vacuum; the complement reads vacuum with e^{-1.96}.
        assert!((error.value() - 0.5 * (-1.96f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn alpha_is_recorded_to_two_decimals() {
        assert!((round_to_hundredths(0.704_999) - 0.7).abs() < 1e-12);
        assert!((round_to_hundredths(0.125_1) - 0.13).abs() < 1e-12);
    }

    #[test]
    fn seeded_streams_are_independent_of_scheduling() {
        let mut first = alpha_rng(Some(3), 2);
        let mut second = alpha_rng(Some(3), 2);
        assert_eq!(first.gen::<u64>(), second.gen::<u64>());
    }
}
