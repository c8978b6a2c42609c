//! Variational energies never undercut the exact ground state.

use qlt_models::circuits::{j1j2_alternating_ansatz, j1j2_full_ansatz, tfim_ansatz};
use qlt_models::problems::{Boundary, ground_state_energy, j1j2_hamiltonian, tfim_hamiltonian};
use qlt_sim::{Statevector, expectation_value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_parameters(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI))
        .collect()
}

#[test]
fn j1j2_ansatz_energies_above_ground_state() {
    let hamiltonian = j1j2_hamiltonian(4, 1.25, 1.0);
    let e0 = ground_state_energy(&hamiltonian).unwrap();
    let mut rng = StdRng::seed_from_u64(1234);

    for circuit in [
        j1j2_alternating_ansatz(4, 2).unwrap(),
        j1j2_full_ansatz(4, 1).unwrap(),
    ] {
        for _ in 0..10 {
            let params = random_parameters(&mut rng, circuit.num_parameters());
            let state = Statevector::from_parameterized(&circuit, &params).unwrap();
            let energy = expectation_value(&hamiltonian, &state).unwrap();
            assert!(energy >= e0 - 1e-9, "{energy} < {e0}");
        }
    }
}

#[test]
fn tfim_ansatz_at_zero_is_plus_state() {
    // All-zero angles leave |+⟩^n, whose energy is −h·n.
    let hamiltonian = tfim_hamiltonian(5, 1.0, Boundary::Closed);
    let circuit = tfim_ansatz(5, 3).unwrap();
    let state = Statevector::from_parameterized(&circuit, &[0.0; 6]).unwrap();
    let energy = expectation_value(&hamiltonian, &state).unwrap();
    assert!((energy + 5.0).abs() < 1e-10);
}
