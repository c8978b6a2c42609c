//! QLT Optimize
//!
//! Classical minimizers for circuit cost functions. Every optimizer consumes
//! a plain `FnMut(&[f64]) -> f64` objective and returns an
//! [`OptimizationResult`]:
//!
//! - [`Lbfgsb`]: limited-memory BFGS with finite-difference gradients and
//!   optional box bounds
//! - [`CmaEs`]: separable CMA-ES
//! - [`Cobyla`]: derivative-free trust-region simplex
//!
//! [`OptimizerConfig`] selects and configures one of them from run
//! configuration.
//!
//! # Example
//!
//! ```rust
//! use qlt_optimize::{Lbfgsb, Optimizer};
//!
//! let result = Lbfgsb::new().minimize(
//!     |x| (x[0] - 1.0).powi(2) + (x[1] + 0.5).powi(2),
//!     vec![0.0, 0.0],
//! );
//! assert!(result.converged);
//! assert!((result.optimal_params[0] - 1.0).abs() < 1e-4);
//! ```

mod cmaes;
mod cobyla;
mod config;
mod lbfgsb;
mod result;

pub use cmaes::CmaEs;
pub use cobyla::Cobyla;
pub use config::{ConfiguredOptimizer, OptimizerConfig, OptimizerKind, UnknownOptimizer};
pub use lbfgsb::Lbfgsb;
pub use result::{Bounds, OptimizationResult};

/// A classical minimizer.
pub trait Optimizer {
    /// Minimize `objective` starting from `initial_params`.
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64;
}
