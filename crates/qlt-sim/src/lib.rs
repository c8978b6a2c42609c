//! QLT Simulation
//!
//! Exact simulation of the small variational circuits QLT optimizes:
//!
//! - [`Statevector`]: apply a bound [`qlt_ir::Circuit`] to `|0…0⟩`, read out
//!   probabilities or draw measurement samples
//! - [`PauliHamiltonian`]: weighted sums of Pauli strings and their
//!   expectation values
//! - [`unitary`]: the full unitary of a circuit, for compiling problems
//!
//! Basis states are indexed so that qubit `q` is bit `q` of the index.
//!
//! # Example
//!
//! ```rust
//! use qlt_ir::{Circuit, QubitId};
//! use qlt_sim::{PauliHamiltonian, PauliTerm, Statevector, expectation_value};
//!
//! let mut circuit = Circuit::with_size("bell", 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let state = Statevector::from_circuit(&circuit).unwrap();
//! let zz = PauliHamiltonian::new(vec![PauliTerm::zz(1.0, 0, 1)]);
//! let energy = expectation_value(&zz, &state).unwrap();
//! assert!((energy - 1.0).abs() < 1e-12);
//! ```

pub mod error;
pub mod pauli;
pub mod statevector;
pub mod unitary;

pub use error::{SimError, SimResult};
pub use pauli::{Pauli, PauliHamiltonian, PauliTerm, expectation_value};
pub use statevector::{MAX_QUBITS, Statevector};
pub use unitary::{frobenius_distance, unitary};
