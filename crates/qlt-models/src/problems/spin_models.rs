//! Spin-chain Hamiltonians.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qlt_sim::{PauliHamiltonian, PauliTerm};

use crate::error::ModelError;

/// Boundary condition of a spin chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// `n − 1` bonds.
    #[default]
    Open,
    /// `n` bonds; the last qubit couples back to the first.
    Closed,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Open => write!(f, "open"),
            Boundary::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for Boundary {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Boundary::Open),
            "closed" | "periodic" => Ok(Boundary::Closed),
            other => Err(ModelError::UnknownBoundary(other.to_string())),
        }
    }
}

/// Transverse-field Ising model: `H = −Σ Z_i Z_{i+1} − h Σ X_i`.
///
/// With [`Boundary::Closed`] the bond `(n−1, 0)` is included.
pub fn tfim_hamiltonian(n_qubits: usize, h: f64, boundary: Boundary) -> PauliHamiltonian {
    let bonds = match boundary {
        Boundary::Open => n_qubits.saturating_sub(1),
        Boundary::Closed => n_qubits,
    };

    let mut hamiltonian = PauliHamiltonian::empty();
    for i in 0..bonds {
        let j = (i + 1) % n_qubits;
        if i != j {
            hamiltonian.add_term(PauliTerm::zz(-1.0, i, j));
        }
    }
    for i in 0..n_qubits {
        hamiltonian.add_term(PauliTerm::x(-h, i));
    }
    hamiltonian.simplify()
}

/// J1-J2 Heisenberg chain with open boundaries.
///
/// `H = j1 Σ_i (XX + YY + ZZ)_{i,i+1} + j2 Σ_i (XX + YY + ZZ)_{i,i+2}`.
pub fn j1j2_hamiltonian(n_qubits: usize, j2: f64, j1: f64) -> PauliHamiltonian {
    let mut hamiltonian = PauliHamiltonian::empty();
    for (distance, coupling) in [(1, j1), (2, j2)] {
        for i in 0..n_qubits.saturating_sub(distance) {
            let j = i + distance;
            hamiltonian.add_term(PauliTerm::xx(coupling, i, j));
            hamiltonian.add_term(PauliTerm::yy(coupling, i, j));
            hamiltonian.add_term(PauliTerm::zz(coupling, i, j));
        }
    }
    hamiltonian.simplify()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tfim_open_terms() {
        let h = tfim_hamiltonian(4, 1.0, Boundary::Open);
        assert_eq!(h.num_terms(), 3 + 4);
        assert_eq!(h.num_qubits(), 4);
    }

    #[test]
    fn test_tfim_closed_wraps() {
        let h = tfim_hamiltonian(4, 0.5, Boundary::Closed);
        assert_eq!(h.num_terms(), 4 + 4);
        assert!(h.terms.contains(&PauliTerm::zz(-1.0, 0, 3)));
        assert!(h.terms.contains(&PauliTerm::x(-0.5, 2)));
    }

    #[test]
    fn test_tfim_closed_two_sites_merges_bond() {
        // Bonds (0,1) and (1,0) are the same operator.
        let h = tfim_hamiltonian(2, 1.0, Boundary::Closed);
        assert!(h.terms.contains(&PauliTerm::zz(-2.0, 0, 1)));
    }

    #[test]
    fn test_j1j2_terms() {
        let h = j1j2_hamiltonian(5, 1.25, 1.0);
        assert_eq!(h.num_terms(), 3 * 4 + 3 * 3);
        assert!(h.terms.contains(&PauliTerm::yy(1.25, 1, 3)));
    }

    #[test]
    fn test_zero_j2_drops_terms() {
        let h = j1j2_hamiltonian(4, 0.0, 1.0);
        assert_eq!(h.num_terms(), 9);
    }

    #[test]
    fn test_boundary_parse() {
        assert_eq!("open".parse::<Boundary>().unwrap(), Boundary::Open);
        assert_eq!("Closed".parse::<Boundary>().unwrap(), Boundary::Closed);
        assert!("twisted".parse::<Boundary>().is_err());
    }
}
