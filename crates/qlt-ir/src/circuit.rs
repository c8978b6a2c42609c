//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// A quantum circuit over a fixed register of qubits.
///
/// Gates are stored in application order. A circuit may reference
/// parameter slots; [`Circuit::bind`] produces a concrete copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Declared parameter count; may exceed the slots actually referenced.
    declared_parameters: usize,
    /// Instructions in application order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a circuit with a given number of qubits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            declared_parameters: 0,
            instructions: vec![],
        }
    }

    /// Declare the length of the parameter vector this circuit expects.
    ///
    /// Ansätze whose parameter layout reserves slots that a small register
    /// never touches use this so binding still checks the full vector length.
    pub fn with_declared_parameters(mut self, count: usize) -> Self {
        self.declared_parameters = count;
        self
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let gate_name = instruction.name();
        let expected = instruction.gate.num_qubits();
        let got = instruction.qubits.len() as u32;
        if expected != got {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate_name.to_string(),
                expected,
                got,
            });
        }

        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: Some(gate_name.to_string()),
                });
            }
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: Some(gate_name.to_string()),
                });
            }
        }

        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rx(theta.into()),
            qubit,
        ))
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Ry(theta.into()),
            qubit,
        ))
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(theta.into()),
            qubit,
        ))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, q1, q2))
    }

    /// Apply the `XX^t` power gate.
    pub fn xx_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::XXPow(exponent.into()),
            q1,
            q2,
        ))
    }

    /// Apply the XX rotation gate.
    pub fn rxx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::Rxx(theta.into()),
            q1,
            q2,
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Get the instructions in application order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Get the number of gate operations.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Length of the parameter vector this circuit binds against.
    pub fn num_parameters(&self) -> usize {
        let referenced = self
            .instructions
            .iter()
            .filter_map(|instr| instr.gate.parameter())
            .filter_map(|p| p.parameters().last().copied())
            .max()
            .map_or(0, |max| max + 1);
        referenced.max(self.declared_parameters)
    }

    /// Check whether any gate still references a parameter slot.
    pub fn is_parameterized(&self) -> bool {
        self.instructions
            .iter()
            .any(|instr| instr.gate.is_parameterized())
    }

    /// Circuit depth: the longest chain of gates sharing a qubit.
    pub fn depth(&self) -> usize {
        let mut layer = vec![0usize; self.num_qubits()];
        for instr in &self.instructions {
            let next = instr
                .qubits
                .iter()
                .map(|q| layer[q.index()])
                .max()
                .unwrap_or(0)
                + 1;
            for q in &instr.qubits {
                layer[q.index()] = next;
            }
        }
        layer.into_iter().max().unwrap_or(0)
    }

    /// Bind a parameter vector, producing a circuit of constant gates.
    pub fn bind(&self, values: &[f64]) -> IrResult<Circuit> {
        let expected = self.num_parameters();
        if values.len() != expected {
            return Err(IrError::ParameterCountMismatch {
                expected,
                got: values.len(),
            });
        }

        let instructions = self
            .instructions
            .iter()
            .map(|instr| instr.bind(values))
            .collect::<IrResult<Vec<_>>>()?;

        Ok(Circuit {
            name: self.name.clone(),
            num_qubits: self.num_qubits,
            declared_parameters: 0,
            instructions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_circuit() {
        let mut circuit = Circuit::with_size("bell", 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_ops(), 2);
        assert_eq!(circuit.depth(), 2);
        assert_eq!(circuit.num_parameters(), 0);
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut circuit = Circuit::with_size("small", 1);
        let err = circuit.h(QubitId(3)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { .. }));
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut circuit = Circuit::with_size("dup", 2);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_wrong_arity() {
        let mut circuit = Circuit::with_size("arity", 2);
        let err = circuit
            .apply(Instruction::new(StandardGate::CX, [QubitId(0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_parameter_count_from_slots() {
        let mut circuit = Circuit::with_size("params", 2);
        circuit.rx(ParameterExpression::parameter(0), QubitId(0)).unwrap();
        circuit.rz(ParameterExpression::parameter(4), QubitId(1)).unwrap();
        assert_eq!(circuit.num_parameters(), 5);
    }

    #[test]
    fn test_declared_parameters_dominate() {
        let mut circuit = Circuit::with_size("declared", 1).with_declared_parameters(6);
        circuit.rx(ParameterExpression::parameter(0), QubitId(0)).unwrap();
        assert_eq!(circuit.num_parameters(), 6);
        assert!(circuit.bind(&[0.0; 6]).is_ok());
        assert!(matches!(
            circuit.bind(&[0.0; 1]),
            Err(IrError::ParameterCountMismatch {
                expected: 6,
                got: 1
            })
        ));
    }

    #[test]
    fn test_bind() {
        let mut circuit = Circuit::with_size("bind", 1);
        circuit
            .ry(ParameterExpression::parameter(0) * 2.0, QubitId(0))
            .unwrap();
        assert!(circuit.is_parameterized());

        let bound = circuit.bind(&[0.25]).unwrap();
        assert!(!bound.is_parameterized());
        assert_eq!(
            bound.instructions()[0]
                .gate
                .parameter()
                .and_then(ParameterExpression::as_f64),
            Some(0.5)
        );
    }

    #[test]
    fn test_serde_roundtrip_preserves_parameters() {
        let mut circuit = Circuit::with_size("serde", 2);
        circuit
            .xx_pow(ParameterExpression::parameter(0) / 2.0, QubitId(0), QubitId(1))
            .unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
