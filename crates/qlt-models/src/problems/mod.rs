//! Problem definitions: Hamiltonians, spectra and target distributions.

pub mod distributions;
pub mod spectrum;
pub mod spin_models;

pub use distributions::{
    TargetDistribution, discretized_normal, uniform_random,
};
pub use spectrum::{ground_state_energy, ground_state_energy_on, tridiagonal_min_eigenvalue};
pub use spin_models::{Boundary, j1j2_hamiltonian, tfim_hamiltonian};
