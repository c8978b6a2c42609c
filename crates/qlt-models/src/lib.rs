//! QLT Models
//!
//! The physics side of the experiments:
//!
//! - [`circuits`]: symbolic ansatz circuits for VQE, QCBM and quantum
//!   compiling, each with a matching parameter-count function
//! - [`problems`]: spin-chain Hamiltonians, exact ground-state energies and
//!   QCBM target distributions
//!
//! # Example
//!
//! ```rust
//! use qlt_models::circuits::tfim_ansatz;
//! use qlt_models::problems::{Boundary, ground_state_energy, tfim_hamiltonian};
//! use qlt_sim::{Statevector, expectation_value};
//!
//! let hamiltonian = tfim_hamiltonian(3, 1.0, Boundary::Open);
//! let ansatz = tfim_ansatz(3, 2).unwrap();
//!
//! let state = Statevector::from_parameterized(&ansatz, &[0.1, 0.2, 0.3, 0.4]).unwrap();
//! let energy = expectation_value(&hamiltonian, &state).unwrap();
//! assert!(energy >= ground_state_energy(&hamiltonian).unwrap() - 1e-9);
//! ```

pub mod circuits;
pub mod error;
pub mod problems;

pub use error::{ModelError, ModelResult};
pub use qlt_sim::{Pauli, PauliHamiltonian, PauliTerm};
