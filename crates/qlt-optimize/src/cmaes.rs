//! Separable CMA-ES.
//!
//! The covariance matrix is kept diagonal, so sampling and updates cost
//! `O(n)` per candidate. Learning rates for the covariance follow the
//! separable variant of Ros and Hansen, scaled by `(n + 2) / 3`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::Optimizer;
use crate::result::{Bounds, Counted, OptimizationResult};

/// Generations inspected by the flat-fitness test.
const TOLFUN_WINDOW: usize = 10;

/// CMA-ES optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmaEs {
    /// Initial step size.
    pub sigma0: f64,
    /// Candidates per generation; `None` uses `4 + ⌊3 ln n⌋`.
    pub popsize: Option<usize>,
    /// Stop when every coordinate's step size falls below this.
    pub tolx: f64,
    /// Stop when the best value over recent generations spans less than this.
    pub tolfun: f64,
    /// Maximum number of objective evaluations.
    pub maxfevals: usize,
    /// Optional box; candidates are clamped into it.
    pub bounds: Option<Bounds>,
    /// Seed of the sampling RNG.
    pub seed: u64,
}

impl Default for CmaEs {
    fn default() -> Self {
        Self {
            sigma0: 0.3,
            popsize: None,
            tolx: 1e-11,
            tolfun: 1e-11,
            maxfevals: 100_000,
            bounds: None,
            seed: 0,
        }
    }
}

impl CmaEs {
    /// Create an optimizer with step size `sigma0`.
    pub fn new(sigma0: f64) -> Self {
        Self {
            sigma0,
            ..Self::default()
        }
    }

    /// Set the population size.
    pub fn with_popsize(mut self, popsize: usize) -> Self {
        self.popsize = Some(popsize);
        self
    }

    /// Set the step-size tolerance.
    pub fn with_tolx(mut self, tolx: f64) -> Self {
        self.tolx = tolx;
        self
    }

    /// Set the evaluation budget.
    pub fn with_maxfevals(mut self, maxfevals: usize) -> Self {
        self.maxfevals = maxfevals;
        self
    }

    /// Restrict every parameter to `[lower, upper]`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some(Bounds::new(lower, upper));
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Population size used for `dim` parameters.
    pub fn population_size(&self, dim: usize) -> usize {
        self.popsize
            .unwrap_or_else(|| 4 + (3.0 * (dim.max(1) as f64).ln()).floor() as usize)
            .max(2)
    }
}

impl Optimizer for CmaEs {
    #[allow(clippy::too_many_lines)]
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        if initial_params.is_empty() {
            return OptimizationResult::trivial(objective);
        }

        let dim = initial_params.len();
        let n = dim as f64;
        let lambda = self.population_size(dim);
        let mu = (lambda / 2).max(1);

        // log-linear recombination weights
        let raw: Vec<f64> = (0..mu)
            .map(|i| (mu as f64 + 0.5).ln() - ((i + 1) as f64).ln())
            .collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let c_sigma = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let d_sigma = 1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + c_sigma;
        let c_c = (4.0 + mu_eff / n) / (n + 4.0 + 2.0 * mu_eff / n);
        let separable = (n + 2.0) / 3.0;
        let c_1 = (separable * 2.0 / ((n + 1.3).powi(2) + mu_eff)).min(1.0);
        let c_mu = (separable * 2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff))
            .min(1.0 - c_1)
            .max(0.0);
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut objective = Counted::new(objective);

        let mut mean = initial_params;
        if let Some(bounds) = &self.bounds {
            bounds.project(&mut mean);
        }
        let mut sigma = self.sigma0;
        let mut c_diag = vec![1.0_f64; dim];
        let mut p_sigma = vec![0.0_f64; dim];
        let mut p_c = vec![0.0_f64; dim];

        let mut best = mean.clone();
        let mut best_value = objective.call(&best);
        let mut history = vec![best_value];
        let mut generation_bests: Vec<f64> = Vec::new();

        let mut converged = false;
        let mut message = "maximum number of function evaluations reached".to_string();
        let mut generation = 0usize;

        while objective.evaluations + lambda <= self.maxfevals {
            let population: Vec<Vec<f64>> = (0..lambda)
                .map(|_| {
                    let mut x: Vec<f64> = (0..dim)
                        .map(|i| {
                            let z: f64 = rng.sample(StandardNormal);
                            mean[i] + sigma * c_diag[i].sqrt() * z
                        })
                        .collect();
                    if let Some(bounds) = &self.bounds {
                        bounds.project(&mut x);
                    }
                    x
                })
                .collect();

            let mut fitness: Vec<(usize, f64)> = population
                .iter()
                .enumerate()
                .map(|(i, x)| {
                    let value = objective.call(x);
                    (i, if value.is_nan() { f64::INFINITY } else { value })
                })
                .collect();
            fitness.sort_by(|a, b| a.1.total_cmp(&b.1));
            generation += 1;

            let (best_index, generation_best) = fitness[0];
            if generation_best < best_value {
                best_value = generation_best;
                best.clone_from(&population[best_index]);
            }
            history.push(best_value);
            generation_bests.push(generation_best);

            // recombination
            let old_mean = mean.clone();
            mean = vec![0.0; dim];
            for (rank, &(idx, _)) in fitness.iter().take(mu).enumerate() {
                for i in 0..dim {
                    mean[i] += weights[rank] * population[idx][i];
                }
            }
            let mean_step: Vec<f64> = mean
                .iter()
                .zip(&old_mean)
                .map(|(m, o)| (m - o) / sigma)
                .collect();

            // evolution paths
            let path_scale = (c_sigma * (2.0 - c_sigma) * mu_eff).sqrt();
            for i in 0..dim {
                p_sigma[i] = (1.0 - c_sigma) * p_sigma[i] + path_scale * mean_step[i] / c_diag[i].sqrt();
            }
            let p_sigma_norm = p_sigma.iter().map(|p| p * p).sum::<f64>().sqrt();
            let decay = (1.0 - (1.0 - c_sigma).powi(2 * generation as i32)).sqrt();
            let h_sigma = if p_sigma_norm / decay < (1.4 + 2.0 / (n + 1.0)) * chi_n {
                1.0
            } else {
                0.0
            };
            let c_scale = (c_c * (2.0 - c_c) * mu_eff).sqrt();
            for i in 0..dim {
                p_c[i] = (1.0 - c_c) * p_c[i] + h_sigma * c_scale * mean_step[i];
            }

            // diagonal covariance update
            let correction = (1.0 - h_sigma) * c_c * (2.0 - c_c);
            for i in 0..dim {
                let mut rank_mu = 0.0;
                for (rank, &(idx, _)) in fitness.iter().take(mu).enumerate() {
                    let y = (population[idx][i] - old_mean[i]) / sigma;
                    rank_mu += weights[rank] * y * y;
                }
                c_diag[i] = (1.0 - c_1 - c_mu) * c_diag[i]
                    + c_1 * (p_c[i] * p_c[i] + correction * c_diag[i])
                    + c_mu * rank_mu;
                c_diag[i] = c_diag[i].max(1e-300);
            }

            sigma *= ((c_sigma / d_sigma) * (p_sigma_norm / chi_n - 1.0)).exp();
            sigma = sigma.clamp(1e-300, 1e300);

            trace!(
                "CMA-ES generation {}: best {:.12e}, sigma {:.3e}",
                generation, best_value, sigma
            );

            let largest_step = c_diag
                .iter()
                .zip(&p_c)
                .map(|(c, p)| sigma * c.sqrt().max(p.abs()))
                .fold(0.0, f64::max);
            if largest_step < self.tolx {
                converged = true;
                message = "step size below tolx".to_string();
                break;
            }

            if generation_bests.len() >= TOLFUN_WINDOW {
                let recent = &generation_bests[generation_bests.len() - TOLFUN_WINDOW..];
                let hi = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let lo = recent.iter().copied().fold(f64::INFINITY, f64::min);
                if hi - lo < self.tolfun {
                    converged = true;
                    message = "objective range below tolfun".to_string();
                    break;
                }
            }
        }

        debug!(
            "CMA-ES stopped after {} generations and {} evaluations: {}",
            generation, objective.evaluations, message
        );

        OptimizationResult {
            optimal_params: best,
            optimal_value: best_value,
            num_evaluations: objective.evaluations,
            num_iterations: generation,
            history,
            converged,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    #[test]
    fn test_sphere_converges() {
        let result = CmaEs::new(0.5)
            .with_seed(7)
            .minimize(sphere, vec![1.0, -2.0, 0.5, 1.5]);
        assert!(result.optimal_value < 1e-8, "{:?}", result.message);
        assert!(result.converged);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let run = |seed| {
            CmaEs::new(0.3)
                .with_seed(seed)
                .with_maxfevals(400)
                .minimize(sphere, vec![0.7, -0.4])
        };
        assert_eq!(run(11), run(11));
        assert_ne!(run(11).optimal_params, run(12).optimal_params);
    }

    #[test]
    fn test_budget() {
        let result = CmaEs::new(0.1)
            .with_popsize(10)
            .with_maxfevals(101)
            .with_tolx(0.0)
            .minimize(|x| x[0].sin(), vec![0.0]);
        assert!(result.num_evaluations <= 101);
        assert_eq!(result.num_iterations, 10);
        assert!(!result.converged);
    }

    #[test]
    fn test_bounds_clamp_candidates() {
        let result = CmaEs::new(1.0)
            .with_bounds(0.5, 2.0)
            .with_seed(3)
            .minimize(sphere, vec![1.0, 1.0]);
        assert!(result.optimal_params.iter().all(|v| (0.5..=2.0).contains(v)));
        assert!((result.optimal_value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_adapts_to_badly_scaled_axes() {
        // ellipsoid with axis weights 1, 100 and 10^4
        let ellipsoid = |x: &[f64]| -> f64 {
            x.iter()
                .enumerate()
                .map(|(i, v)| 100f64.powi(i as i32) * v * v)
                .sum()
        };
        let result = CmaEs::new(0.5)
            .with_seed(5)
            .with_maxfevals(20_000)
            .minimize(ellipsoid, vec![1.0, 1.0, 1.0]);
        assert!(result.optimal_value < 1e-8, "{:?}", result.message);
        assert!(result.optimal_params.iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_default_population() {
        assert_eq!(CmaEs::default().population_size(1), 4);
        assert_eq!(CmaEs::default().population_size(10), 10);
        assert_eq!(CmaEs::default().with_popsize(36).population_size(10), 36);
    }
}
