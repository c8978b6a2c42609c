//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// A parameter slot has no value.
    #[error("Parameter θ{0} is unbound")]
    UnboundParameter(usize),

    /// Binding was attempted with the wrong number of values.
    #[error("Circuit has {expected} parameters, got {got} values")]
    ParameterCountMismatch {
        /// Number of parameters the circuit declares.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// An expression evaluated to a non-finite number.
    #[error("Parameter expression '{0}' is not finite")]
    NonFinite(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
