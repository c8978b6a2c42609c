//! Error types for the simulation crate.

use thiserror::Error;

/// Errors produced while simulating circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// A gate still references a parameter slot.
    #[error("Cannot simulate unbound gate '{0}'; bind the circuit first")]
    UnboundGate(String),

    /// The register is too large for dense simulation.
    #[error("Cannot simulate {requested} qubits, maximum is {max}")]
    TooManyQubits {
        /// Requested qubit count.
        requested: usize,
        /// Supported maximum.
        max: usize,
    },

    /// An operator acts on more qubits than the state holds.
    #[error("Operator acts on {required} qubits but the state has {available}")]
    QubitOutOfRange {
        /// Qubits the operator needs.
        required: usize,
        /// Qubits in the state.
        available: usize,
    },

    /// Two matrices or vectors have incompatible shapes.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Sampling requires a state with non-zero norm.
    #[error("Cannot sample from a state with zero norm")]
    ZeroNorm,

    /// Circuit IR error while binding parameters.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qlt_ir::IrError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
