//! Quantum gate types.

use serde::{Deserialize, Serialize};

use crate::error::IrResult;
use crate::parameter::ParameterExpression;

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// `XX^t`: phase `e^{iπt}` on the −1 eigenspace of `X⊗X`, identity on
    /// the +1 eigenspace.
    XXPow(ParameterExpression),
    /// XX rotation gate `exp(−iθ/2 X⊗X)`.
    Rxx(ParameterExpression),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::H => "h",
            StandardGate::X => "x",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::XXPow(_) => "xxpow",
            StandardGate::Rxx(_) => "rxx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::H
            | StandardGate::X
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_) => 1,

            StandardGate::CX | StandardGate::CZ | StandardGate::XXPow(_) | StandardGate::Rxx(_) => {
                2
            }
        }
    }

    /// The parameter expression of this gate, if it has one.
    pub fn parameter(&self) -> Option<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::XXPow(p)
            | StandardGate::Rxx(p) => Some(p),
            StandardGate::H | StandardGate::X | StandardGate::CX | StandardGate::CZ => None,
        }
    }

    /// Check if this gate still references parameter slots.
    pub fn is_parameterized(&self) -> bool {
        self.parameter().is_some_and(ParameterExpression::is_symbolic)
    }

    /// Substitute the parameter vector into this gate.
    pub fn bind(&self, values: &[f64]) -> IrResult<Self> {
        Ok(match self {
            StandardGate::Rx(p) => StandardGate::Rx(p.bind(values)?),
            StandardGate::Ry(p) => StandardGate::Ry(p.bind(values)?),
            StandardGate::Rz(p) => StandardGate::Rz(p.bind(values)?),
            StandardGate::XXPow(p) => StandardGate::XXPow(p.bind(values)?),
            StandardGate::Rxx(p) => StandardGate::Rxx(p.bind(values)?),
            StandardGate::H | StandardGate::X | StandardGate::CX | StandardGate::CZ => self.clone(),
        })
    }
}

impl std::fmt::Display for StandardGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.parameter() {
            Some(p) => write!(f, "{}({p})", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}
