//! QLT Cost
//!
//! Cost functions that wrap circuit simulation for the optimizers:
//!
//! - [`VqeCost`]: Hamiltonian energy plus a periodic weight-decay penalty
//! - [`QcbmCost`]: clipped negative log-likelihood of a target distribution
//! - [`CompilingCost`]: Frobenius distance to a target unitary
//!
//! All of them take only the unpruned parameters and pad the pruned slots
//! back in before simulating. Each evaluation is reported to a [`Tracker`];
//! [`JsonlTracker`] writes one JSON Lines file per optimization run.
//!
//! # Example
//!
//! ```rust
//! use qlt_cost::{CostFunction, VqeCost, minimize};
//! use qlt_models::circuits::tfim_ansatz;
//! use qlt_models::problems::{Boundary, ground_state_energy, tfim_hamiltonian};
//! use qlt_optimize::Lbfgsb;
//!
//! let hamiltonian = tfim_hamiltonian(2, 1.0, Boundary::Open);
//! let e0 = ground_state_energy(&hamiltonian).unwrap();
//! let mut cost = VqeCost::new(hamiltonian, tfim_ansatz(2, 1).unwrap()).with_offset(-e0);
//!
//! let result = minimize(&Lbfgsb::new(), &mut cost, vec![0.1, 0.1]).unwrap();
//! assert!(result.optimal_value >= -1e-9);
//! ```

pub mod compiling;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod qcbm;
pub mod tracker;
pub mod vqe;

pub use compiling::CompilingCost;
pub use cost::{CostFunction, minimize};
pub use error::{CostError, CostResult};
pub use metrics::Metrics;
pub use qcbm::{DEFAULT_CLIP, QcbmCost, clipped_negative_log_likelihood};
pub use tracker::{JsonlTracker, MemoryTracker, NullTracker, RunRecord, Tracker, read_run};
pub use vqe::VqeCost;
