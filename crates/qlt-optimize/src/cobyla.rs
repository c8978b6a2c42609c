//! Derivative-free trust-region simplex.
//!
//! Reflection steps are limited to the trust radius `rho`, which shrinks
//! from `rhobeg` towards `rhoend` whenever the simplex flattens out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Optimizer;
use crate::result::{Counted, OptimizationResult};

/// COBYLA optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cobyla {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Convergence tolerance on the simplex value spread.
    pub tol: f64,
    /// Initial trust region radius.
    pub rhobeg: f64,
    /// Final trust region radius.
    pub rhoend: f64,
}

impl Default for Cobyla {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            tol: 1e-6,
            rhobeg: 0.5,
            rhoend: 1e-4,
        }
    }
}

impl Cobyla {
    /// Create a new COBYLA optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set trust region parameters.
    pub fn with_trust_region(mut self, rhobeg: f64, rhoend: f64) -> Self {
        self.rhobeg = rhobeg;
        self.rhoend = rhoend;
        self
    }
}

/// Simplex around `origin` with edges of length `rho` along each axis.
fn axis_simplex<F>(
    objective: &mut Counted<F>,
    origin: &[f64],
    f_origin: f64,
    rho: f64,
) -> (Vec<Vec<f64>>, Vec<f64>)
where
    F: FnMut(&[f64]) -> f64,
{
    let mut simplex = vec![origin.to_vec()];
    let mut values = vec![f_origin];
    for i in 0..origin.len() {
        let mut point = origin.to_vec();
        point[i] += rho;
        values.push(sanitize(objective.call(&point)));
        simplex.push(point);
    }
    (simplex, values)
}

/// Treat NaN as the worst possible value.
fn sanitize(value: f64) -> f64 {
    if value.is_nan() { f64::INFINITY } else { value }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i)
}

impl Optimizer for Cobyla {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        if initial_params.is_empty() {
            return OptimizationResult::trivial(objective);
        }

        let n = initial_params.len();
        let mut objective = Counted::new(objective);
        let f_initial = sanitize(objective.call(&initial_params));
        let mut best_value = f_initial;
        let mut history = vec![f_initial];

        let mut rho = self.rhobeg;
        let (mut simplex, mut f_simplex) =
            axis_simplex(&mut objective, &initial_params, f_initial, rho);

        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.maxiter {
            iterations += 1;
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| f_simplex[a].total_cmp(&f_simplex[b]));
            let best_idx = order[0];
            let worst_idx = order[n];

            let spread = f_simplex[worst_idx] - f_simplex[best_idx];
            if spread < self.tol {
                if rho <= self.rhoend {
                    converged = true;
                    break;
                }
                // flat at this radius: shrink and rebuild around the best point
                rho = (rho * 0.5).max(self.rhoend);
                let best = simplex[best_idx].clone();
                let f_best = f_simplex[best_idx];
                (simplex, f_simplex) = axis_simplex(&mut objective, &best, f_best, rho);
                continue;
            }

            let mut centroid = vec![0.0; n];
            for &idx in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += x;
                }
            }
            for c in &mut centroid {
                *c /= n as f64;
            }

            // reflection, limited to the trust radius
            let reflected: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst_idx])
                .map(|(c, w)| {
                    let diff = c - w;
                    c + diff.max(-rho).min(rho)
                })
                .collect();
            let f_reflected = sanitize(objective.call(&reflected));

            if f_reflected < f_simplex[best_idx] {
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(&reflected)
                    .map(|(c, r)| c + 2.0 * (r - c))
                    .collect();
                let f_expanded = sanitize(objective.call(&expanded));
                if f_expanded < f_reflected {
                    simplex[worst_idx] = expanded;
                    f_simplex[worst_idx] = f_expanded;
                } else {
                    simplex[worst_idx] = reflected;
                    f_simplex[worst_idx] = f_reflected;
                }
            } else if f_reflected < f_simplex[order[n - 1]] {
                simplex[worst_idx] = reflected;
                f_simplex[worst_idx] = f_reflected;
            } else {
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(&simplex[worst_idx])
                    .map(|(c, w)| 0.5 * (c + w))
                    .collect();
                let f_contracted = sanitize(objective.call(&contracted));
                if f_contracted < f_simplex[worst_idx] {
                    simplex[worst_idx] = contracted;
                    f_simplex[worst_idx] = f_contracted;
                } else {
                    // shrink towards the best vertex
                    let best = simplex[best_idx].clone();
                    for i in 0..=n {
                        if i != best_idx {
                            for (x, b) in simplex[i].iter_mut().zip(&best) {
                                *x = 0.5 * (b + *x);
                            }
                            f_simplex[i] = sanitize(objective.call(&simplex[i]));
                        }
                    }
                }
            }

            let current = f_simplex[argmin(&f_simplex)];
            if current < best_value {
                best_value = current;
            }
            history.push(best_value);
        }

        let best_idx = argmin(&f_simplex);
        let message = if converged {
            "simplex spread below tol at final trust radius"
        } else {
            "maximum number of iterations reached"
        };
        debug!(
            "COBYLA stopped after {} iterations and {} evaluations: {}",
            iterations, objective.evaluations, message
        );

        OptimizationResult {
            optimal_params: simplex[best_idx].clone(),
            optimal_value: f_simplex[best_idx],
            num_evaluations: objective.evaluations,
            num_iterations: iterations,
            history,
            converged,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cobyla_simple() {
        let cobyla = Cobyla::new().with_maxiter(2000);

        // Minimize (x-1)^2 + (y-2)^2
        let result = cobyla.minimize(
            |params| {
                let x = params[0];
                let y = params[1];
                (x - 1.0).powi(2) + (y - 2.0).powi(2)
            },
            vec![0.0, 0.0],
        );

        assert!(result.optimal_value < 0.01);
        assert!((result.optimal_params[0] - 1.0).abs() < 0.1);
        assert!((result.optimal_params[1] - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_cobyla_rosenbrock() {
        let cobyla = Cobyla::new().with_maxiter(500);

        // Rosenbrock function (minimum at (1, 1))
        let result = cobyla.minimize(
            |params| {
                let x = params[0];
                let y = params[1];
                (1.0 - x).powi(2) + 100.0 * (y - x.powi(2)).powi(2)
            },
            vec![0.0, 0.0],
        );

        // Rosenbrock is hard, just check we improved
        assert!(result.optimal_value < 1.0);
    }

    #[test]
    fn test_nan_is_never_chosen() {
        let result = Cobyla::new().with_maxiter(50).minimize(
            |x| if x[0] > 0.2 { f64::NAN } else { x[0].powi(2) },
            vec![0.1],
        );
        assert!(result.optimal_value.is_finite());
    }
}
