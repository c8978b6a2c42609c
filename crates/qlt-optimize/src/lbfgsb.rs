//! Limited-memory BFGS with box bounds.
//!
//! Gradients are estimated with central differences, falling back to a
//! one-sided difference when a step would leave the bounds. Search
//! directions come from the usual two-loop recursion over the last `m`
//! correction pairs; components that would push a parameter through an
//! active bound are dropped, and steps are projected back into the box.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::Optimizer;
use crate::result::{Bounds, Counted, OptimizationResult};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;
/// Backtracking steps before the line search gives up.
const MAX_BACKTRACKS: usize = 40;

/// L-BFGS-B optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lbfgsb {
    /// Stop when the relative decrease of the objective falls below this.
    pub ftol: f64,
    /// Stop when the projected gradient's largest component falls below this.
    pub gtol: f64,
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Maximum number of objective evaluations, gradient estimates included.
    pub maxfun: usize,
    /// Number of correction pairs kept.
    pub m: usize,
    /// Finite-difference step.
    pub eps: f64,
    /// Optional box applied to every parameter.
    pub bounds: Option<Bounds>,
}

impl Default for Lbfgsb {
    fn default() -> Self {
        Self {
            ftol: 2.220_446_049_250_313e-9,
            gtol: 1e-5,
            maxiter: 15000,
            maxfun: 15000,
            m: 10,
            eps: 1e-8,
            bounds: None,
        }
    }
}

impl Lbfgsb {
    /// Create an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relative function tolerance.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Set the projected gradient tolerance.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set maximum objective evaluations.
    pub fn with_maxfun(mut self, maxfun: usize) -> Self {
        self.maxfun = maxfun;
        self
    }

    /// Restrict every parameter to `[lower, upper]`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some(Bounds::new(lower, upper));
        self
    }

    fn project(&self, x: &mut [f64]) {
        if let Some(bounds) = &self.bounds {
            bounds.project(x);
        }
    }

    fn gradient<F>(&self, objective: &mut Counted<F>, x: &[f64]) -> Vec<f64>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let (lower, upper) = match &self.bounds {
            Some(b) => (b.lower, b.upper),
            None => (f64::NEG_INFINITY, f64::INFINITY),
        };
        let mut probe = x.to_vec();
        let mut grad = vec![0.0; x.len()];

        for i in 0..x.len() {
            let xi = x[i];
            let forward = (xi + self.eps).min(upper);
            let backward = (xi - self.eps).max(lower);
            let width = forward - backward;
            if width <= 0.0 {
                continue;
            }

            probe[i] = forward;
            let f_forward = objective.call(&probe);
            probe[i] = backward;
            let f_backward = objective.call(&probe);
            probe[i] = xi;

            grad[i] = (f_forward - f_backward) / width;
        }
        grad
    }

    /// Projected gradient infinity norm.
    fn projected_gradient_norm(&self, x: &[f64], grad: &[f64]) -> f64 {
        x.iter()
            .zip(grad)
            .map(|(xi, gi)| match &self.bounds {
                Some(b) => (b.clamp(xi - gi) - xi).abs(),
                None => gi.abs(),
            })
            .fold(0.0, f64::max)
    }

    /// Zero out components of `d` that push through an active bound.
    fn restrict_direction(&self, x: &[f64], d: &mut [f64]) {
        if let Some(b) = &self.bounds {
            for (xi, di) in x.iter().zip(d.iter_mut()) {
                if (*xi <= b.lower && *di < 0.0) || (*xi >= b.upper && *di > 0.0) {
                    *di = 0.0;
                }
            }
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Two-loop recursion: approximates `−H⁻¹ g` from the stored pairs.
fn two_loop_direction(grad: &[f64], s_history: &[Vec<f64>], y_history: &[Vec<f64>]) -> Vec<f64> {
    let mut q: Vec<f64> = grad.iter().map(|g| -g).collect();
    let k = s_history.len();
    if k == 0 {
        return q;
    }

    let mut alpha = vec![0.0; k];
    let rho: Vec<f64> = s_history
        .iter()
        .zip(y_history)
        .map(|(s, y)| 1.0 / dot(y, s))
        .collect();

    for i in (0..k).rev() {
        alpha[i] = rho[i] * dot(&s_history[i], &q);
        for (qj, yj) in q.iter_mut().zip(&y_history[i]) {
            *qj -= alpha[i] * yj;
        }
    }

    let (s_last, y_last) = (&s_history[k - 1], &y_history[k - 1]);
    let gamma = dot(s_last, y_last) / dot(y_last, y_last);
    for qj in &mut q {
        *qj *= gamma;
    }

    for i in 0..k {
        let beta = rho[i] * dot(&y_history[i], &q);
        for (qj, sj) in q.iter_mut().zip(&s_history[i]) {
            *qj += sj * (alpha[i] - beta);
        }
    }
    q
}

impl Optimizer for Lbfgsb {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        if initial_params.is_empty() {
            return OptimizationResult::trivial(objective);
        }

        let mut objective = Counted::new(objective);
        let mut x = initial_params;
        self.project(&mut x);
        let mut fx = objective.call(&x);
        let mut history = vec![fx];

        if !fx.is_finite() {
            return OptimizationResult {
                optimal_params: x,
                optimal_value: fx,
                num_evaluations: objective.evaluations,
                num_iterations: 0,
                history,
                converged: false,
                message: "objective is not finite at the initial point".to_string(),
            };
        }

        let mut grad = self.gradient(&mut objective, &x);
        let mut s_history: Vec<Vec<f64>> = Vec::with_capacity(self.m);
        let mut y_history: Vec<Vec<f64>> = Vec::with_capacity(self.m);

        let mut converged = false;
        let mut message = "maximum number of iterations reached".to_string();
        let mut iterations = 0;

        while iterations < self.maxiter {
            if self.projected_gradient_norm(&x, &grad) <= self.gtol {
                converged = true;
                message = "projected gradient norm below gtol".to_string();
                break;
            }
            if objective.evaluations >= self.maxfun {
                message = "maximum number of function evaluations reached".to_string();
                break;
            }

            let mut d = two_loop_direction(&grad, &s_history, &y_history);
            self.restrict_direction(&x, &mut d);
            if dot(&grad, &d) >= 0.0 {
                // not a descent direction; restart from steepest descent
                s_history.clear();
                y_history.clear();
                d = grad.iter().map(|g| -g).collect();
                self.restrict_direction(&x, &mut d);
            }

            // without curvature information, take a unit-length first step
            let mut step = if s_history.is_empty() {
                let largest = d.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                if largest > 0.0 {
                    (1.0 / largest).min(1.0)
                } else {
                    1.0
                }
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut candidate: Vec<f64> =
                    x.iter().zip(&d).map(|(xi, di)| xi + step * di).collect();
                self.project(&mut candidate);
                let displacement: Vec<f64> =
                    candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
                let f_candidate = objective.call(&candidate);
                let bound = fx + ARMIJO_C1 * dot(&grad, &displacement);
                if f_candidate.is_finite() && f_candidate <= bound {
                    accepted = Some((candidate, f_candidate, displacement));
                    break;
                }
                if objective.evaluations >= self.maxfun {
                    break;
                }
                step *= 0.5;
            }

            let Some((x_new, f_new, s)) = accepted else {
                message = "line search could not find a lower point".to_string();
                break;
            };
            iterations += 1;

            let grad_new = self.gradient(&mut objective, &x_new);
            let y: Vec<f64> = grad_new.iter().zip(&grad).map(|(a, b)| a - b).collect();
            if dot(&y, &s) > f64::EPSILON * dot(&y, &y) {
                if s_history.len() == self.m {
                    s_history.remove(0);
                    y_history.remove(0);
                }
                s_history.push(s);
                y_history.push(y);
            }

            let relative_reduction = (fx - f_new) / fx.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            fx = f_new;
            grad = grad_new;
            history.push(fx);
            trace!("L-BFGS-B iteration {}: f = {:.12e}", iterations, fx);

            if relative_reduction <= self.ftol {
                converged = true;
                message = "relative reduction of f below ftol".to_string();
                break;
            }
        }

        debug!(
            "L-BFGS-B stopped after {} iterations and {} evaluations: {}",
            iterations, objective.evaluations, message
        );

        OptimizationResult {
            optimal_params: x,
            optimal_value: fx,
            num_evaluations: objective.evaluations,
            num_iterations: iterations,
            history,
            converged,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic() {
        let result = Lbfgsb::new().minimize(
            |x| (x[0] - 3.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2),
            vec![0.0, 0.0],
        );
        assert!(result.converged, "{}", result.message);
        assert_relative_eq!(result.optimal_params[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_params[1], -1.0, epsilon = 1e-4);
        assert!(result.optimal_value < 1e-8);
    }

    #[test]
    fn test_rosenbrock() {
        let result = Lbfgsb::new().with_ftol(0.0).with_gtol(1e-7).minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            vec![-1.2, 1.0],
        );
        assert!(result.optimal_value < 1e-6, "{:?}", result);
        assert_relative_eq!(result.optimal_params[0], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_bounds_are_respected() {
        // unconstrained minimum at 2; the box stops it at 1
        let result = Lbfgsb::new()
            .with_bounds(-1.0, 1.0)
            .minimize(|x| (x[0] - 2.0).powi(2), vec![0.0]);
        assert_relative_eq!(result.optimal_params[0], 1.0, epsilon = 1e-9);
        assert!(result.converged);
    }

    #[test]
    fn test_counts_all_evaluations() {
        let mut calls = 0;
        let result = Lbfgsb::new().minimize(
            |x| {
                calls += 1;
                x.iter().map(|v| v * v).sum()
            },
            vec![0.5, -0.25, 1.0],
        );
        assert_eq!(result.num_evaluations, calls);
        assert_eq!(result.history.len(), result.num_iterations + 1);
    }

    #[test]
    fn test_maxfun_stops_early() {
        let result = Lbfgsb::new()
            .with_maxfun(10)
            .with_ftol(0.0)
            .with_gtol(0.0)
            .minimize(|x| x.iter().map(|v| v.cos()).sum(), vec![0.1; 4]);
        assert!(!result.converged);
        // one gradient estimate may overshoot the budget
        assert!(result.num_evaluations <= 10 + 2 * 4 + MAX_BACKTRACKS);
    }

    #[test]
    fn test_non_finite_start() {
        let result = Lbfgsb::new().minimize(|_| f64::NAN, vec![1.0]);
        assert!(!result.converged);
        assert_eq!(result.num_evaluations, 1);
    }

    #[test]
    fn test_empty_parameters() {
        let result = Lbfgsb::new().minimize(|_| 4.0, vec![]);
        assert_eq!(result.optimal_value, 4.0);
        assert!(result.converged);
    }
}
