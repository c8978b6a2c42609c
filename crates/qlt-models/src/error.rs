//! Error types for the models crate.

use thiserror::Error;

/// Errors produced while building circuits, Hamiltonians or distributions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The ansatz or model needs more qubits.
    #[error("{model} requires at least {min} qubits, got {got}")]
    TooFewQubits {
        /// Name of the model.
        model: &'static str,
        /// Minimum supported qubit count.
        min: usize,
        /// Requested qubit count.
        got: usize,
    },

    /// Hamiltonian contains no terms.
    #[error("Hamiltonian is empty")]
    EmptyHamiltonian,

    /// A distribution parameter is invalid.
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Unknown boundary condition name.
    #[error("Unknown boundary condition '{0}' (expected 'open' or 'closed')")]
    UnknownBoundary(String),

    /// Circuit builder returned an error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qlt_ir::IrError),

    /// Simulation failed.
    #[error("Simulation error: {0}")]
    Sim(#[from] qlt_sim::SimError),
}

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;
