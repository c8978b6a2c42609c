//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};

use crate::error::IrResult;
use crate::gate::StandardGate;
use crate::qubit::QubitId;

/// A gate applied to specific qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The gate.
    pub gate: StandardGate,
    /// Qubits this instruction operates on, in gate operand order.
    pub qubits: Vec<QubitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn new(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            gate,
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::new(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::new(gate, [q1, q2])
    }

    /// Get the gate name.
    pub fn name(&self) -> &'static str {
        self.gate.name()
    }

    /// Substitute the parameter vector into this instruction's gate.
    pub fn bind(&self, values: &[f64]) -> IrResult<Self> {
        Ok(Self {
            gate: self.gate.bind(values)?,
            qubits: self.qubits.clone(),
        })
    }
}
