//! Pure single-mode Gaussian states and their photon-number statistics.
//!
//! Every operation the circuit applies keeps a mode in the form `D(δ) S(r) |0⟩` with real `δ`
//! and `r`, so a mode is fully described by those two numbers. Fock amplitudes follow from the
//! three-term recurrence obtained by expanding the annihilator
//! `(a - δ) cosh r + (a† - δ) sinh r` in the number basis.

use crate::dual::Dual;

/// A mode in the state `D(displacement) S(squeezing) |0⟩`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeState {
    displacement: Dual,
    squeezing: Dual,
}

impl ModeState {
    #[must_use]
    pub fn vacuum() -> Self {
        ModeState::coherent(Dual::constant(0.0))
    }

    /// The coherent state `|amplitude⟩`.
    #[must_use]
    pub fn coherent(amplitude: Dual) -> Self {
        ModeState {
            displacement: amplitude,
            squeezing: Dual::constant(0.0),
        }
    }

    #[must_use]
    pub fn displacement(&self) -> &Dual {
        &self.displacement
    }

    #[must_use]
    pub fn squeezing(&self) -> &Dual {
        &self.squeezing
    }

    /// Apply `D(beta)`.
    pub fn displace(&mut self, beta: &Dual) {
        self.displacement = &self.displacement + beta;
    }

    /// Apply `S(r)`; squeezing conjugates the current displacement to `δ e^{-r}`.
    pub fn squeeze(&mut self, r: &Dual) {
        self.displacement = &self.displacement * &(-r).exp();
        self.squeezing = &self.squeezing + r;
    }

    /// Fock amplitudes `⟨n|ψ⟩` for `n = 0, 1, 2, ...`.
    #[must_use]
    pub fn amplitudes(&self) -> Amplitudes {
        Amplitudes::new(self)
    }

    /// Probabilities of reading `0 .. count` photons.
    #[must_use]
    pub fn probabilities(&self, count: usize) -> Vec<Dual> {
        self.amplitudes().take(count).map(|amplitude| amplitude.square()).collect()
    }

    /// Probability of reading exactly `photons` photons.
    #[must_use]
    pub fn probability(&self, photons: usize) -> Dual {
        self.amplitudes()
            .nth(photons)
            .map_or_else(|| Dual::constant(0.0), |amplitude| amplitude.square())
    }
}

/// Iterator over the Fock amplitudes of a [`ModeState`].
///
/// With `μ = cosh r`, `ν = sinh r`:
/// `c₀ = exp(-δ²(1 + ν/μ)/2) / √μ` and
/// `c_{n+1} = (δ eʳ/μ · c_n - ν/μ · √n · c_{n-1}) / √(n+1)`.
#[derive(Debug, Clone)]
pub struct Amplitudes {
    drive: Dual,
    damping: Dual,
    previous: Dual,
    current: Dual,
    photons: usize,
}

impl Amplitudes {
    fn new(mode: &ModeState) -> Self {
        let delta = &mode.displacement;
        let cosh = mode.squeezing.cosh();
        let sinh = mode.squeezing.sinh();
        let tanh = &sinh / &cosh;

        let exponent = -(delta.square() * (1.0 + &tanh)) / 2.0;
        let vacuum_overlap = exponent.exp() / cosh.sqrt();

        Amplitudes {
            drive: delta * &mode.squeezing.exp() / &cosh,
            damping: tanh,
            previous: Dual::constant(0.0),
            current: vacuum_overlap,
            photons: 0,
        }
    }
}

impl Iterator for Amplitudes {
    type Item = Dual;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<Dual> {
        let amplitude = self.current.clone();
        let n = self.photons as f64;
        let next = (&self.drive * &self.current - &self.damping * &self.previous * n.sqrt()) / (n + 1.0).sqrt();
        self.previous = std::mem::replace(&mut self.current, next);
        self.photons += 1;
        Some(amplitude)
    }
}

/// Photon-number statistics of a product of single-mode states.
///
/// Produced by a zero-shot run. When `truncation` is set, Fock components at or above it are
/// absent from the state and their probability is zero.
#[derive(Debug, Clone)]
pub struct FockState {
    modes: Vec<ModeState>,
    tables: Vec<Vec<Dual>>,
    truncation: Option<usize>,
    cutoff_dim: usize,
}

impl FockState {
    /// Tabulate the first `cutoff_dim` probabilities of every mode.
    #[must_use]
    pub fn new(modes: Vec<ModeState>, cutoff_dim: usize, truncated: bool) -> Self {
        let tables = modes.iter().map(|mode| mode.probabilities(cutoff_dim)).collect();
        FockState {
            modes,
            tables,
            truncation: truncated.then_some(cutoff_dim),
            cutoff_dim,
        }
    }

    #[must_use]
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    #[must_use]
    pub fn cutoff_dim(&self) -> usize {
        self.cutoff_dim
    }

    #[must_use]
    pub fn modes(&self) -> &[ModeState] {
        &self.modes
    }

    /// Probability of the joint photon-number outcome `indices`, one count per mode.
    ///
    /// # Panics
    ///
    /// Panics if `indices` does not have one entry per mode.
    #[must_use]
    pub fn fock_prob(&self, indices: &[usize]) -> Dual {
        assert_eq!(
            indices.len(),
            self.modes.len(),
            "expected one photon count per mode, got {indices:?}"
        );
        indices
            .iter()
            .enumerate()
            .fold(Dual::constant(1.0), |product, (mode, &photons)| {
                &product * &self.mode_probability(mode, photons)
            })
    }

    /// Total probability inside the cutoff, at most one.
    #[must_use]
    pub fn trace(&self) -> Dual {
        self.tables
            .iter()
            .fold(Dual::constant(1.0), |product, table| &product * &table.iter().sum::<Dual>())
    }

    fn mode_probability(&self, mode: usize, photons: usize) -> Dual {
        if let Some(probability) = self.tables[mode].get(photons) {
            return probability.clone();
        }
        match self.truncation {
            Some(_) => Dual::constant(0.0),
            None => self.modes[mode].probability(photons),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poisson(mean: f64, photons: u32) -> f64 {
        let factorial: f64 = (1..=photons).map(f64::from).product();
        (-mean).exp() * mean.powi(i32::try_from(photons).unwrap()) / factorial
    }

    #[test]
    fn coherent_state_is_poissonian() {
        let mode = ModeState::coherent(Dual::constant(0.8));
        for (photons, probability) in (0u32..).zip(mode.probabilities(8)) {
            assert!((probability.value() - poisson(0.64, photons)).abs() < 1e-12);
        }
    }

    #[test]
    fn displacement_nulls_a_coherent_state() {
        let mut mode = ModeState::coherent(Dual::constant(0.7));
        mode.displace(&Dual::constant(-0.7));
        assert!((mode.probability(0).value() - 1.0).abs() < 1e-12);
        assert!(mode.probability(3).value().abs() < 1e-12);
    }

    #[test]
    fn squeezed_vacuum_has_even_photon_numbers() {
        let mut mode = ModeState::vacuum();
        mode.squeeze(&Dual::constant(0.5));
        let probabilities = mode.probabilities(40);
        for odd in probabilities.iter().skip(1).step_by(2) {
            assert!(odd.value().abs() < 1e-15);
        }
        let norm: f64 = probabilities.iter().map(Dual::value).sum();
        assert!((norm - 1.0).abs() < 1e-6);
        let expected_vacuum = 1.0 / 0.5f64.cosh();
        assert!((probabilities[0].value() - expected_vacuum).abs() < 1e-12);
    }

    #[test]
    fn displaced_squeezed_state_is_normalised() {
        let mut mode = ModeState::coherent(Dual::constant(1.1));
        mode.squeeze(&Dual::constant(0.3));
        mode.displace(&Dual::constant(-0.4));
        let norm: f64 = mode.probabilities(80).iter().map(Dual::value).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn squeezing_shrinks_the_displacement() {
        let mut mode = ModeState::coherent(Dual::constant(1.0));
        mode.squeeze(&Dual::constant(2.0f64.ln()));
        assert!((mode.displacement().value() - 0.5).abs() < 1e-12);
        assert!((mode.squeezing().value() - 2.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let two_photon_probability = |beta: f64, r: f64| {
            let mut mode = ModeState::coherent(Dual::constant(0.6));
            mode.displace(&Dual::variable(beta, 0, 2));
            mode.squeeze(&Dual::variable(r, 1, 2));
            mode.probability(2)
        };
        let (beta, r, step) = (-0.2, 0.15, 1e-6);
        let probability = two_photon_probability(beta, r);
        let d_beta = (two_photon_probability(beta + step, r).value() - two_photon_probability(beta - step, r).value())
            / (2.0 * step);
        let d_r = (two_photon_probability(beta, r + step).value() - two_photon_probability(beta, r - step).value())
            / (2.0 * step);
        assert!((probability.partial(0) - d_beta).abs() < 1e-6);
        assert!((probability.partial(1) - d_r).abs() < 1e-6);
    }

    #[test]
    fn truncated_state_drops_components_beyond_cutoff() {
        let mode = ModeState::coherent(Dual::constant(1.0));
        let truncated = FockState::new(vec![mode.clone()], 3, true);
        let exact = FockState::new(vec![mode], 3, false);
        assert_eq!(truncated.fock_prob(&[5]).value(), 0.0);
        assert!((exact.fock_prob(&[5]).value() - poisson(1.0, 5)).abs() < 1e-12);
        assert!(truncated.trace().value() < 1.0);
    }

    #[test]
    fn joint_probability_is_a_product() {
        let modes = vec![
            ModeState::coherent(Dual::constant(0.5)),
            ModeState::coherent(Dual::constant(-0.3)),
        ];
        let state = FockState::new(modes, 5, true);
        let expected = poisson(0.25, 1) * poisson(0.09, 2);
        assert!((state.fock_prob(&[1, 2]).value() - expected).abs() < 1e-12);
    }
}
