//! Optimization results and shared box bounds.

use serde::{Deserialize, Serialize};

/// Result of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Optimal parameter values.
    pub optimal_params: Vec<f64>,
    /// Optimal objective value.
    pub optimal_value: f64,
    /// Number of function evaluations.
    pub num_evaluations: usize,
    /// Number of iterations.
    pub num_iterations: usize,
    /// Best objective value after each iteration.
    pub history: Vec<f64>,
    /// Whether a convergence criterion was met.
    pub converged: bool,
    /// Why the run stopped.
    pub message: String,
}

impl OptimizationResult {
    /// Result for an objective without parameters: a single evaluation.
    pub(crate) fn trivial<F>(mut objective: F) -> Self
    where
        F: FnMut(&[f64]) -> f64,
    {
        let value = objective(&[]);
        Self {
            optimal_params: Vec::new(),
            optimal_value: value,
            num_evaluations: 1,
            num_iterations: 0,
            history: vec![value],
            converged: true,
            message: "no parameters to optimize".to_string(),
        }
    }
}

/// The same closed interval applied to every parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl Bounds {
    /// Interval `[lower, upper]`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Clamp `value` into the interval.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// Clamp every entry of `values` in place.
    pub fn project(&self, values: &mut [f64]) {
        for v in values {
            *v = self.clamp(*v);
        }
    }
}

/// Counts calls to an objective.
pub(crate) struct Counted<F> {
    objective: F,
    pub(crate) evaluations: usize,
}

impl<F> Counted<F>
where
    F: FnMut(&[f64]) -> f64,
{
    pub(crate) fn new(objective: F) -> Self {
        Self {
            objective,
            evaluations: 0,
        }
    }

    pub(crate) fn call(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        (self.objective)(x)
    }
}
