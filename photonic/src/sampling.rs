//! Photon-count sampling for Fock measurements.

use rand::Rng;

use crate::state::ModeState;

/// Inverse-CDF sampler over the photon-number distribution of one mode.
///
/// A truncated sampler draws from the distribution restricted to `0..limit` and renormalised.
/// An untruncated sampler tabulates until the cumulative mass reaches `1 - COVERAGE_TOLERANCE`
/// or `MAX_PHOTONS` terms, whichever comes first.
#[derive(Debug, Clone)]
pub struct PhotonCountSampler {
    cdf: Vec<f64>,
}

impl PhotonCountSampler {
    const COVERAGE_TOLERANCE: f64 = 1e-12;
    const MAX_PHOTONS: usize = 4096;

    #[must_use]
    pub fn new(mode: &ModeState, limit: Option<usize>) -> Self {
        let bound = limit.unwrap_or(Self::MAX_PHOTONS).max(1);
        let mut cdf = Vec::with_capacity(limit.unwrap_or(16));
        let mut cumulative = 0.0;
        for amplitude in mode.amplitudes().take(bound) {
            cumulative += amplitude.value() * amplitude.value();
            cdf.push(cumulative);
            if limit.is_none() && cumulative >= 1.0 - Self::COVERAGE_TOLERANCE {
                break;
            }
        }

        if cumulative > 0.0 {
            for c in &mut cdf {
                *c /= cumulative;
            }
        } else {
            // Every tabulated component vanished; fall back to the vacuum.
            cdf.iter_mut().for_each(|c| *c = 1.0);
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        PhotonCountSampler { cdf }
    }

    /// Number of photon counts the sampler can return.
    #[must_use]
    pub fn support(&self) -> usize {
        self.cdf.len()
    }

    /// Probability the sampler assigns to reading `photons`.
    #[must_use]
    pub fn probability(&self, photons: usize) -> f64 {
        match photons {
            0 => self.cdf.first().copied().unwrap_or(0.0),
            n if n < self.cdf.len() => self.cdf[n] - self.cdf[n - 1],
            _ => 0.0,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.gen();
        let photons = self.cdf.partition_point(|&c| c < u);
        photons.min(self.cdf.len() - 1)
    }
}
