//! Quantum circuit Born machine ansatz.
//!
//! Layer layout for `n` qubits with all-to-all entanglement:
//!
//! | Layer | Gates | Parameters |
//! |-------|-------|------------|
//! | first | Rx, Rz on every qubit | `2n` |
//! | odd index | Rxx on every pair `(i, j)`, `i < j` | `n(n−1)/2` |
//! | even index, not last | Rz, Rx, Rz on every qubit | `3n` |
//! | even index, last | Rz, Rx on every qubit | `2n` |

use qlt_ir::{Circuit, ParameterExpression, QubitId};

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    X,
    Z,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QcbmLayer {
    Rotations(Vec<Rotation>),
    Entangling,
}

fn layer_plan(layers: usize) -> Vec<QcbmLayer> {
    (0..layers)
        .map(|index| {
            if index == 0 {
                QcbmLayer::Rotations(vec![Rotation::X, Rotation::Z])
            } else if index % 2 == 1 {
                QcbmLayer::Entangling
            } else if index == layers - 1 {
                QcbmLayer::Rotations(vec![Rotation::Z, Rotation::X])
            } else {
                QcbmLayer::Rotations(vec![Rotation::Z, Rotation::X, Rotation::Z])
            }
        })
        .collect()
}

/// Number of parameters of a QCBM ansatz.
pub fn qcbm_num_parameters(n_qubits: usize, layers: usize) -> usize {
    let pairs = n_qubits * n_qubits.saturating_sub(1) / 2;
    layer_plan(layers)
        .iter()
        .map(|layer| match layer {
            QcbmLayer::Rotations(gates) => gates.len() * n_qubits,
            QcbmLayer::Entangling => pairs,
        })
        .sum()
}

/// Build the symbolic QCBM ansatz circuit.
///
/// Within a rotation layer all qubits receive the first rotation before
/// any receives the second.
pub fn qcbm_ansatz(n_qubits: usize, layers: usize) -> ModelResult<Circuit> {
    if n_qubits == 0 {
        return Err(ModelError::TooFewQubits {
            model: "qcbm",
            min: 1,
            got: 0,
        });
    }

    let mut circuit = Circuit::with_size("qcbm", n_qubits as u32)
        .with_declared_parameters(qcbm_num_parameters(n_qubits, layers));
    let mut slot = 0;
    let mut next = || {
        let p = ParameterExpression::parameter(slot);
        slot += 1;
        p
    };

    for layer in layer_plan(layers) {
        match layer {
            QcbmLayer::Rotations(gates) => {
                for gate in gates {
                    for q in 0..n_qubits {
                        let q = QubitId::from(q);
                        match gate {
                            Rotation::X => circuit.rx(next(), q)?,
                            Rotation::Z => circuit.rz(next(), q)?,
                        };
                    }
                }
            }
            QcbmLayer::Entangling => {
                for i in 0..n_qubits {
                    for j in (i + 1)..n_qubits {
                        circuit.rxx(next(), QubitId::from(i), QubitId::from(j))?;
                    }
                }
            }
        }
    }

    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_counts() {
        assert_eq!(qcbm_num_parameters(4, 1), 8);
        assert_eq!(qcbm_num_parameters(4, 2), 8 + 6);
        assert_eq!(qcbm_num_parameters(4, 3), 8 + 6 + 8);
        assert_eq!(qcbm_num_parameters(4, 4), 8 + 6 + 12 + 6);
        assert_eq!(qcbm_num_parameters(4, 5), 8 + 6 + 12 + 6 + 8);
    }

    #[test]
    fn test_circuit_matches_count() {
        for layers in 1..6 {
            let circuit = qcbm_ansatz(3, layers).unwrap();
            assert_eq!(circuit.num_parameters(), qcbm_num_parameters(3, layers));
        }
    }

    #[test]
    fn test_first_layer_order() {
        let circuit = qcbm_ansatz(2, 1).unwrap();
        let names: Vec<_> = circuit.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["rx", "rx", "rz", "rz"]);
    }

    #[test]
    fn test_zero_qubits() {
        assert!(qcbm_ansatz(0, 2).is_err());
    }
}
