//! QLT Circuit Representation
//!
//! This crate provides the data structures used to describe the variational
//! ansatz circuits studied by QLT. Circuits are built once with symbolic
//! parameter slots (`θ₀, θ₁, ...`) and then bound to a concrete parameter
//! vector for every cost-function evaluation.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a wire of the circuit
//! - **Parameters**: [`ParameterExpression`] for affine (and more general)
//!   expressions over parameter slots
//! - **Gates**: [`StandardGate`] for the gate set used by the ansätze
//! - **Instructions**: [`Instruction`] combining a gate with its operands
//! - **Circuit**: [`Circuit`] builder API and parameter binding
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use qlt_ir::{Circuit, ParameterExpression, QubitId};
//! use std::f64::consts::PI;
//!
//! let mut circuit = Circuit::with_size("variational", 2);
//! let theta = ParameterExpression::parameter(0);
//!
//! circuit.h(QubitId(0)).unwrap();
//! circuit.rz(ParameterExpression::pi() / 2.0 - theta, QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_parameters(), 1);
//!
//! let bound = circuit.bind(&[PI / 4.0]).unwrap();
//! assert!(!bound.is_parameterized());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X` | 1 | Pauli-X gate |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `CX`, `CZ` | 2 | Controlled-NOT and controlled-Z |
//! | `XXPow` | 2 | `XX^t`, eigenphase `e^{iπt}` on the −1 eigenspace of `X⊗X` |
//! | `Rxx` | 2 | `exp(−iθ/2 X⊗X)` |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::Instruction;
pub use parameter::ParameterExpression;
pub use qubit::QubitId;
