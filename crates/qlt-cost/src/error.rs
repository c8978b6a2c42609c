//! Error types for cost functions and tracking.

use thiserror::Error;

/// Errors produced while evaluating a cost or recording a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CostError {
    /// The optimizer passed the wrong number of parameters.
    #[error("Cost function expects {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Unpruned parameters the cost function optimizes.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },

    /// A target distribution or unitary is unusable.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Pruning bookkeeping error.
    #[error("Pruning error: {0}")]
    Prune(#[from] qlt_prune::PruneError),

    /// Circuit IR error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qlt_ir::IrError),

    /// Simulation error.
    #[error("Simulation error: {0}")]
    Sim(#[from] qlt_sim::SimError),

    /// Model construction error.
    #[error("Model error: {0}")]
    Model(#[from] qlt_models::ModelError),

    /// Tracker I/O error.
    #[error("Tracker I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracker serialization error.
    #[error("Tracker serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cost operations.
pub type CostResult<T> = Result<T, CostError>;
