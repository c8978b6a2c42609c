//! Exact ground-state energies of Pauli Hamiltonians.
//!
//! The lowest eigenvalue is found with the Lanczos method using full
//! reorthogonalization, so the Krylov basis stays orthonormal to machine
//! precision. Eigenvalues of the resulting tridiagonal matrix are located by
//! Sturm-sequence bisection.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use qlt_sim::{MAX_QUBITS, PauliHamiltonian, SimError};

use crate::error::{ModelError, ModelResult};

/// Krylov dimension limit for large registers.
const MAX_KRYLOV_DIM: usize = 300;
/// Ritz-value change below which the iteration stops.
const CONVERGENCE_TOL: f64 = 1e-12;
/// Residual norm treated as an exhausted Krylov space.
const BREAKDOWN_TOL: f64 = 1e-12;
/// Seed of the Lanczos start vector.
const START_SEED: u64 = 0x5eed_1a2c;

fn inner(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

fn norm(a: &[Complex64]) -> f64 {
    a.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt()
}

/// Number of eigenvalues of the symmetric tridiagonal matrix below `x`.
fn sturm_count(diag: &[f64], off: &[f64], x: f64) -> usize {
    let mut count = 0;
    let mut d = 1.0;
    for (i, &a) in diag.iter().enumerate() {
        let coupling = if i == 0 { 0.0 } else { off[i - 1] * off[i - 1] };
        d = a - x - if i == 0 { 0.0 } else { coupling / d };
        if d == 0.0 {
            d = -f64::EPSILON * (a.abs() + x.abs()).max(1.0);
        }
        if d < 0.0 {
            count += 1;
        }
    }
    count
}

/// Smallest eigenvalue of a symmetric tridiagonal matrix.
pub fn tridiagonal_min_eigenvalue(diag: &[f64], off: &[f64]) -> f64 {
    if diag.is_empty() {
        return 0.0;
    }

    // Gershgorin bounds
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for (i, &a) in diag.iter().enumerate() {
        let left = if i == 0 { 0.0 } else { off[i - 1].abs() };
        let right = off.get(i).map_or(0.0, |b| b.abs());
        lo = lo.min(a - left - right);
        hi = hi.max(a + left + right);
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if sturm_count(diag, off, mid) >= 1 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Lowest eigenvalue of `hamiltonian` on `n_qubits` qubits.
pub fn ground_state_energy_on(
    hamiltonian: &PauliHamiltonian,
    n_qubits: usize,
) -> ModelResult<f64> {
    if hamiltonian.num_terms() == 0 {
        return Err(ModelError::EmptyHamiltonian);
    }
    if n_qubits > MAX_QUBITS {
        return Err(SimError::TooManyQubits {
            requested: n_qubits,
            max: MAX_QUBITS,
        }
        .into());
    }

    let dim = 1usize << n_qubits;
    let krylov_limit = dim.min(MAX_KRYLOV_DIM);

    let mut rng = StdRng::seed_from_u64(START_SEED);
    let mut v: Vec<Complex64> = (0..dim)
        .map(|_| Complex64::new(rng.r#gen::<f64>() - 0.5, rng.r#gen::<f64>() - 0.5))
        .collect();
    let n0 = norm(&v);
    v.iter_mut().for_each(|x| *x /= n0);

    let mut basis: Vec<Vec<Complex64>> = Vec::with_capacity(krylov_limit);
    let mut alphas: Vec<f64> = Vec::with_capacity(krylov_limit);
    let mut betas: Vec<f64> = Vec::with_capacity(krylov_limit);
    let mut w = vec![Complex64::new(0.0, 0.0); dim];
    let mut previous = f64::INFINITY;
    let mut estimate = f64::INFINITY;

    for step in 0..krylov_limit {
        hamiltonian.apply(&v, &mut w)?;
        let alpha = inner(&v, &w).re;
        alphas.push(alpha);
        basis.push(v.clone());

        // Two passes of Gram-Schmidt against the whole basis
        for _ in 0..2 {
            for u in &basis {
                let overlap = inner(u, &w);
                w.iter_mut().zip(u).for_each(|(x, y)| *x -= overlap * y);
            }
        }

        estimate = tridiagonal_min_eigenvalue(&alphas, &betas);
        let beta = norm(&w);
        if beta < BREAKDOWN_TOL || step + 1 == krylov_limit {
            break;
        }
        if (previous - estimate).abs() < CONVERGENCE_TOL * estimate.abs().max(1.0) {
            break;
        }
        previous = estimate;

        betas.push(beta);
        v = w.iter().map(|x| *x / beta).collect();
    }

    debug!(
        "Lanczos: {} qubits, Krylov dimension {}, E0 = {:.12}",
        n_qubits,
        alphas.len(),
        estimate
    );
    Ok(estimate)
}

/// Lowest eigenvalue of `hamiltonian` on the qubits it acts on.
pub fn ground_state_energy(hamiltonian: &PauliHamiltonian) -> ModelResult<f64> {
    ground_state_energy_on(hamiltonian, hamiltonian.num_qubits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::{Boundary, j1j2_hamiltonian, tfim_hamiltonian};
    use approx::assert_relative_eq;
    use qlt_sim::{Pauli, PauliTerm};

    /// Dense real matrix of a Hamiltonian whose terms hold an even number
    /// of `Y` factors. Qubit `q` is bit `q` of the basis index.
    fn dense_matrix(hamiltonian: &PauliHamiltonian, n_qubits: usize) -> Vec<Vec<f64>> {
        let dim = 1usize << n_qubits;
        let mut matrix = vec![vec![0.0; dim]; dim];
        for term in &hamiltonian.terms {
            let ys = term.operators.iter().filter(|(_, p)| *p == Pauli::Y).count();
            assert_eq!(ys % 2, 0, "complex term {term}");
            // i^ys
            let base = if ys % 4 == 0 { 1.0 } else { -1.0 };
            for col in 0..dim {
                let mut row = col;
                let mut sign = base;
                for &(q, pauli) in &term.operators {
                    let bit = (col >> q) & 1;
                    match pauli {
                        Pauli::I => {}
                        Pauli::X => row ^= 1 << q,
                        // Y|0> = i|1>, Y|1> = -i|0>
                        Pauli::Y => {
                            row ^= 1 << q;
                            if bit == 1 {
                                sign = -sign;
                            }
                        }
                        Pauli::Z => {
                            if bit == 1 {
                                sign = -sign;
                            }
                        }
                    }
                }
                matrix[row][col] += term.coefficient * sign;
            }
        }
        matrix
    }

    /// Smallest eigenvalue of a real symmetric matrix by cyclic Jacobi sweeps.
    fn jacobi_min_eigenvalue(mut a: Vec<Vec<f64>>) -> f64 {
        let n = a.len();
        for _ in 0..100 {
            let off: f64 = (0..n)
                .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
                .map(|(i, j)| a[i][j] * a[i][j])
                .sum();
            if off < 1e-24 {
                break;
            }
            for p in 0..n {
                for q in (p + 1)..n {
                    if a[p][q].abs() < 1e-300 {
                        continue;
                    }
                    let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;
                    for row in a.iter_mut() {
                        let (kp, kq) = (row[p], row[q]);
                        row[p] = c * kp - s * kq;
                        row[q] = s * kp + c * kq;
                    }
                    for k in 0..n {
                        let (pk, qk) = (a[p][k], a[q][k]);
                        a[p][k] = c * pk - s * qk;
                        a[q][k] = s * pk + c * qk;
                    }
                }
            }
        }
        (0..n).map(|i| a[i][i]).fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_tridiagonal_diagonal() {
        let min = tridiagonal_min_eigenvalue(&[3.0, -1.0, 2.0], &[0.0, 0.0]);
        assert_relative_eq!(min, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tridiagonal_two_by_two() {
        // [[0, 1], [1, 0]] has eigenvalues ±1
        let min = tridiagonal_min_eigenvalue(&[0.0, 0.0], &[1.0]);
        assert_relative_eq!(min, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_qubit_field() {
        let h = PauliHamiltonian::new(vec![PauliTerm::x(0.6, 0), PauliTerm::z(0.8, 0)]);
        assert_relative_eq!(ground_state_energy(&h).unwrap(), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_two_qubit_tfim() {
        // −ZZ − X₀ − X₁ has ground energy −√5
        let h = tfim_hamiltonian(2, 1.0, Boundary::Open);
        let energy = ground_state_energy(&h).unwrap();
        assert_relative_eq!(energy, -(5.0f64).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_heisenberg_singlet() {
        // XX + YY + ZZ on two sites: singlet at −3
        let h = j1j2_hamiltonian(2, 0.0, 1.0);
        assert_relative_eq!(ground_state_energy(&h).unwrap(), -3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_identity_offset() {
        let h = PauliHamiltonian::new(vec![PauliTerm::identity(2.5), PauliTerm::z(1.0, 0)]);
        assert_relative_eq!(ground_state_energy(&h).unwrap(), 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_tfim_chain_matches_free_fermions() {
        // Open TFIM at h = 1: E0 = 1 − 1/sin(π/(2(2n+1))) for n sites
        let n = 6;
        let h = tfim_hamiltonian(n, 1.0, Boundary::Open);
        let exact = 1.0 - 1.0 / (std::f64::consts::PI / (2.0 * (2 * n + 1) as f64)).sin();
        assert_relative_eq!(ground_state_energy(&h).unwrap(), exact, epsilon = 1e-8);
    }

    #[test]
    fn test_dense_reference_values() {
        let j1j2_4 = dense_matrix(&j1j2_hamiltonian(4, 1.25, 1.0), 4);
        assert_relative_eq!(jacobi_min_eigenvalue(j1j2_4), -8.145751311065, epsilon = 1e-9);
        // Majumdar-Ghosh point: the dimer product state at −3 per dimer
        let j1j2_6 = dense_matrix(&j1j2_hamiltonian(6, 0.5, 1.0), 6);
        assert_relative_eq!(jacobi_min_eigenvalue(j1j2_6), -9.0, epsilon = 1e-9);
        let tfim_5 = dense_matrix(&tfim_hamiltonian(5, 1.0, Boundary::Closed), 5);
        assert_relative_eq!(jacobi_min_eigenvalue(tfim_5), -6.472135955, epsilon = 1e-8);
    }

    #[test]
    fn test_lanczos_matches_dense_diagonalization() {
        for n in 3..=6 {
            let mut models = Vec::new();
            for j2 in [0.0, 0.5, 1.25] {
                models.push(j1j2_hamiltonian(n, j2, 1.0));
            }
            for field in [0.5, 1.0, 2.0] {
                models.push(tfim_hamiltonian(n, field, Boundary::Closed));
                models.push(tfim_hamiltonian(n, field, Boundary::Open));
            }
            for h in &models {
                let dense = jacobi_min_eigenvalue(dense_matrix(h, n));
                let lanczos = ground_state_energy(h).unwrap();
                assert!(
                    (lanczos - dense).abs() < 1e-8,
                    "n = {n}: lanczos {lanczos}, dense {dense}\n{h}"
                );
            }
        }
    }

    #[test]
    fn test_empty_hamiltonian() {
        assert!(matches!(
            ground_state_energy(&PauliHamiltonian::empty()),
            Err(ModelError::EmptyHamiltonian)
        ));
    }
}
