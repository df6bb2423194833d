//! Minimisers for the receiver cost.
//!
//! The cost is a [`Dual`]: gradient-based minimisers read its gradient when present and fall
//! back to central finite differences otherwise, so the driver never branches on the backend.

use photonic::{BackendKind, Dual};

use crate::error::Result;

/// Produces an updated parameter vector from a cost function.
pub trait Minimizer {
    /// # Errors
    ///
    /// Propagates the first error returned by `cost`.
    fn minimize<F>(&mut self, cost: F, initial: &[f64]) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<Dual>;

    /// Forget any state carried between invocations.
    fn reset(&mut self);
}

/// Adam with bias correction; one update per [`Minimizer::minimize`] call.
///
/// Moments persist across calls, so repeated calls form one optimisation run.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Vec<f64>,
    v: Vec<f64>,
    t: i32,
}

impl Adam {
    const FINITE_DIFFERENCE_STEP: f64 = 1e-4;

    #[must_use]
    pub fn new(learning_rate: f64) -> Self {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    #[must_use]
    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn gradient<F>(cost: &mut F, params: &[f64]) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<Dual>,
    {
        let value = cost(params)?;
        if let Some(gradient) = value.gradient() {
            return Ok((0..params.len()).map(|index| gradient.get(index).copied().unwrap_or(0.0)).collect());
        }

        let mut shifted = params.to_vec();
        let mut gradient = Vec::with_capacity(params.len());
        for index in 0..params.len() {
            shifted[index] = params[index] + Self::FINITE_DIFFERENCE_STEP;
            let forward = cost(&shifted)?.value();
            shifted[index] = params[index] - Self::FINITE_DIFFERENCE_STEP;
            let backward = cost(&shifted)?.value();
            shifted[index] = params[index];
            gradient.push((forward - backward) / (2.0 * Self::FINITE_DIFFERENCE_STEP));
        }
        Ok(gradient)
    }

    fn step(&mut self, params: &mut [f64], gradient: &[f64]) {
        if self.m.len() != params.len() {
            self.m = vec![0.0; params.len()];
            self.v = vec![0.0; params.len()];
        }

        self.t = self.t.saturating_add(1);
        let bias_correction1 = 1.0 - self.beta1.powi(self.t);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t);

        for (index, (param, &g)) in params.iter_mut().zip(gradient).enumerate() {
            self.m[index] = self.beta1 * self.m[index] + (1.0 - self.beta1) * g;
            self.v[index] = self.beta2 * self.v[index] + (1.0 - self.beta2) * g * g;
            let m_hat = self.m[index] / bias_correction1;
            let v_hat = self.v[index] / bias_correction2;
            *param -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

impl Minimizer for Adam {
    fn minimize<F>(&mut self, mut cost: F, initial: &[f64]) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<Dual>,
    {
        let gradient = Self::gradient(&mut cost, initial)?;
        let mut params = initial.to_vec();
        self.step(&mut params, &gradient);
        Ok(params)
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }
}

/// Derivative-free downhill simplex, run to convergence on each call.
///
/// Uses the standard reflection, expansion, contraction and shrink coefficients
/// `(1, 2, 0.5, 0.5)` and stops once both the simplex and its cost values span less than
/// their tolerances, or after `max_iterations`.
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: Option<usize>,
    x_tolerance: f64,
    f_tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        NelderMead {
            max_iterations: None,
            x_tolerance: 1e-4,
            f_tolerance: 1e-4,
        }
    }
}

impl NelderMead {
    const ITERATIONS_PER_PARAMETER: usize = 200;
    const RELATIVE_STEP: f64 = 0.05;
    const ZERO_STEP: f64 = 0.00025;

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    #[must_use]
    pub fn with_tolerances(mut self, x_tolerance: f64, f_tolerance: f64) -> Self {
        self.x_tolerance = x_tolerance;
        self.f_tolerance = f_tolerance;
        self
    }

    #[allow(clippy::float_cmp)]
    fn initial_simplex(initial: &[f64]) -> Vec<Vec<f64>> {
        let mut simplex = vec![initial.to_vec()];
        for index in 0..initial.len() {
            let mut vertex = initial.to_vec();
            vertex[index] = if vertex[index] == 0.0 {
                Self::ZERO_STEP
            } else {
                vertex[index] * (1.0 + Self::RELATIVE_STEP)
            };
            simplex.push(vertex);
        }
        simplex
    }

    fn converged(&self, simplex: &[Vec<f64>], values: &[f64]) -> bool {
        let best = &simplex[0];
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|vertex| vertex.iter().zip(best).map(|(x, b)| (x - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = values[1..].iter().map(|v| (v - values[0]).abs()).fold(0.0, f64::max);
        x_spread <= self.x_tolerance && f_spread <= self.f_tolerance
    }
}

/// `centroid + coefficient * (centroid - worst)`
fn along(centroid: &[f64], worst: &[f64], coefficient: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(worst)
        .map(|(c, w)| c + coefficient * (c - w))
        .collect()
}

impl Minimizer for NelderMead {
    #[allow(clippy::cast_precision_loss)]
    fn minimize<F>(&mut self, mut cost: F, initial: &[f64]) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<Dual>,
    {
        let dimension = initial.len();
        if dimension == 0 {
            return Ok(Vec::new());
        }
        let max_iterations = self
            .max_iterations
            .unwrap_or(Self::ITERATIONS_PER_PARAMETER * dimension);

        let mut simplex = Self::initial_simplex(initial);
        let mut values = simplex
            .iter()
            .map(|vertex| cost(vertex).map(|value| value.value()))
            .collect::<Result<Vec<f64>>>()?;

        for _ in 0..max_iterations {
            let mut order: Vec<usize> = (0..=dimension).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();
            if self.converged(&simplex, &values) {
                break;
            }

            let centroid: Vec<f64> = (0..dimension)
                .map(|axis| simplex[..dimension].iter().map(|vertex| vertex[axis]).sum::<f64>() / dimension as f64)
                .collect();
            let worst = simplex[dimension].clone();

            let reflected = along(&centroid, &worst, 1.0);
            let reflected_value = cost(&reflected)?.value();
            if reflected_value < values[0] {
                let expanded = along(&centroid, &worst, 2.0);
                let expanded_value = cost(&expanded)?.value();
                if expanded_value < reflected_value {
                    simplex[dimension] = expanded;
                    values[dimension] = expanded_value;
                } else {
                    simplex[dimension] = reflected;
                    values[dimension] = reflected_value;
                }
                continue;
            }
            if reflected_value < values[dimension - 1] {
                simplex[dimension] = reflected;
                values[dimension] = reflected_value;
                continue;
            }

            let (contracted, threshold) = if reflected_value < values[dimension] {
                (along(&centroid, &worst, 0.5), reflected_value)
            } else {
                (along(&centroid, &worst, -0.5), values[dimension])
            };
            let contracted_value = cost(&contracted)?.value();
            if contracted_value <= threshold {
                simplex[dimension] = contracted;
                values[dimension] = contracted_value;
                continue;
            }

            let best = simplex[0].clone();
            for index in 1..=dimension {
                simplex[index] = best
                    .iter()
                    .zip(&simplex[index])
                    .map(|(b, x)| b + 0.5 * (x - b))
                    .collect();
                values[index] = cost(&simplex[index])?.value();
            }
        }

        let best = values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(index, _)| index);
        Ok(simplex.swap_remove(best))
    }

    fn reset(&mut self) {}
}

/// The minimiser matching a backend: Adam when gradients are available, Nelder-Mead otherwise.
#[derive(Debug, Clone)]
pub enum Optimizer {
    Adam(Adam),
    NelderMead(NelderMead),
}

impl Optimizer {
    #[must_use]
    pub fn for_backend(kind: BackendKind, learning_rate: f64) -> Self {
        if kind.is_differentiable() {
            Optimizer::Adam(Adam::new(learning_rate))
        } else {
            Optimizer::NelderMead(NelderMead::default())
        }
    }
}

impl Minimizer for Optimizer {
    fn minimize<F>(&mut self, cost: F, initial: &[f64]) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<Dual>,
    {
        match self {
            Optimizer::Adam(adam) => adam.minimize(cost, initial),
            Optimizer::NelderMead(nelder_mead) => nelder_mead.minimize(cost, initial),
        }
    }

    fn reset(&mut self) {
        match self {
            Optimizer::Adam(adam) => adam.reset(),
            Optimizer::NelderMead(nelder_mead) => nelder_mead.reset(),
        }
    }
}
