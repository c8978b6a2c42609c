//! Pauli Hamiltonian representation.
//!
//! A Hamiltonian is represented as a sum of Pauli strings:
//! H = Σᵢ cᵢ Pᵢ
//! where each Pᵢ is a tensor product of Pauli operators.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// A single Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity operator.
    I,
    /// Pauli-X operator.
    X,
    /// Pauli-Y operator.
    Y,
    /// Pauli-Z operator.
    Z,
}

impl Pauli {
    /// Get the name of this Pauli operator.
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::I => "I",
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }
}

impl std::fmt::Display for Pauli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single term in a Pauli Hamiltonian.
///
/// Represents cᵢ * (P₀ ⊗ P₁ ⊗ ... ⊗ Pₙ); only non-identity Paulis are
/// stored, sorted by qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// The coefficient of this term.
    pub coefficient: f64,
    /// The non-identity Pauli operators, as (qubit_index, pauli).
    /// Empty means identity on all qubits.
    pub operators: Vec<(usize, Pauli)>,
}

impl PauliTerm {
    /// Create a new Pauli term. Each qubit may appear at most once.
    pub fn new(coefficient: f64, operators: Vec<(usize, Pauli)>) -> Self {
        let mut operators: Vec<_> = operators
            .into_iter()
            .filter(|(_, p)| *p != Pauli::I)
            .collect();
        operators.sort_by_key(|(q, _)| *q);
        debug_assert!(
            operators.windows(2).all(|w| w[0].0 != w[1].0),
            "Pauli term acts twice on one qubit"
        );
        Self {
            coefficient,
            operators,
        }
    }

    /// Create an identity term (scalar).
    pub fn identity(coefficient: f64) -> Self {
        Self::new(coefficient, vec![])
    }

    /// Create a single-qubit Z term.
    pub fn z(coefficient: f64, qubit: usize) -> Self {
        Self::new(coefficient, vec![(qubit, Pauli::Z)])
    }

    /// Create a single-qubit X term.
    pub fn x(coefficient: f64, qubit: usize) -> Self {
        Self::new(coefficient, vec![(qubit, Pauli::X)])
    }

    /// Create a single-qubit Y term.
    pub fn y(coefficient: f64, qubit: usize) -> Self {
        Self::new(coefficient, vec![(qubit, Pauli::Y)])
    }

    /// Create a ZZ term.
    pub fn zz(coefficient: f64, qubit1: usize, qubit2: usize) -> Self {
        Self::new(coefficient, vec![(qubit1, Pauli::Z), (qubit2, Pauli::Z)])
    }

    /// Create an XX term.
    pub fn xx(coefficient: f64, qubit1: usize, qubit2: usize) -> Self {
        Self::new(coefficient, vec![(qubit1, Pauli::X), (qubit2, Pauli::X)])
    }

    /// Create a YY term.
    pub fn yy(coefficient: f64, qubit1: usize, qubit2: usize) -> Self {
        Self::new(coefficient, vec![(qubit1, Pauli::Y), (qubit2, Pauli::Y)])
    }

    /// Check if this is an identity term.
    pub fn is_identity(&self) -> bool {
        self.operators.is_empty()
    }

    /// Get the maximum qubit index.
    pub fn max_qubit(&self) -> Option<usize> {
        self.operators.last().map(|(q, _)| *q)
    }

    /// Map basis state `index` through this Pauli string.
    ///
    /// Returns the image index and the accumulated phase, so that
    /// `P|index⟩ = phase · |image⟩`.
    fn apply_to_basis(&self, index: usize) -> (usize, Complex64) {
        let mut image = index;
        let mut phase = Complex64::new(1.0, 0.0);

        for &(qubit, pauli) in &self.operators {
            let bit = (index >> qubit) & 1;
            match pauli {
                Pauli::I => {}
                Pauli::X => image ^= 1 << qubit,
                Pauli::Y => {
                    image ^= 1 << qubit;
                    phase *= if bit == 0 {
                        Complex64::new(0.0, 1.0)
                    } else {
                        Complex64::new(0.0, -1.0)
                    };
                }
                Pauli::Z => {
                    if bit == 1 {
                        phase = -phase;
                    }
                }
            }
        }

        (image, phase)
    }
}

impl std::fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.coefficient >= 0.0 {
            write!(f, "+{:.4} ", self.coefficient)?;
        } else {
            write!(f, "{:.4} ", self.coefficient)?;
        }

        if self.operators.is_empty() {
            write!(f, "I")?;
        } else {
            for (i, (qubit, pauli)) in self.operators.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}[{}]", pauli, qubit)?;
            }
        }
        Ok(())
    }
}

/// A Hamiltonian represented as a sum of Pauli terms.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PauliHamiltonian {
    /// The terms in the Hamiltonian.
    pub terms: Vec<PauliTerm>,
}

impl PauliHamiltonian {
    /// Create a new Hamiltonian from a list of terms.
    pub fn new(terms: Vec<PauliTerm>) -> Self {
        Self { terms }
    }

    /// Create an empty Hamiltonian.
    pub fn empty() -> Self {
        Self { terms: vec![] }
    }

    /// Add a term to the Hamiltonian.
    pub fn add_term(&mut self, term: PauliTerm) {
        self.terms.push(term);
    }

    /// Get the number of terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Get the number of qubits needed.
    pub fn num_qubits(&self) -> usize {
        self.terms
            .iter()
            .filter_map(PauliTerm::max_qubit)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Get the identity coefficient (if any).
    pub fn identity_coefficient(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.is_identity())
            .map(|t| t.coefficient)
            .sum()
    }

    /// Merge terms with identical Pauli strings and drop zero coefficients.
    ///
    /// Terms keep the order of their first occurrence.
    pub fn simplify(self) -> Self {
        let mut slots: FxHashMap<Vec<(usize, Pauli)>, usize> = FxHashMap::default();
        let mut merged: Vec<PauliTerm> = Vec::with_capacity(self.terms.len());

        for term in self.terms {
            match slots.get(&term.operators) {
                Some(&slot) => merged[slot].coefficient += term.coefficient,
                None => {
                    slots.insert(term.operators.clone(), merged.len());
                    merged.push(term);
                }
            }
        }

        merged.retain(|t| t.coefficient != 0.0);
        Self { terms: merged }
    }

    /// Compute `H|ψ⟩` for a dense vector over `num_qubits` qubits.
    pub fn apply(&self, input: &[Complex64], output: &mut [Complex64]) -> SimResult<()> {
        if input.len() != output.len() {
            return Err(SimError::DimensionMismatch {
                expected: input.len(),
                got: output.len(),
            });
        }
        self.check_fits(input.len())?;

        output.fill(Complex64::new(0.0, 0.0));
        for term in &self.terms {
            for (i, &amp) in input.iter().enumerate() {
                let (j, phase) = term.apply_to_basis(i);
                output[j] += term.coefficient * phase * amp;
            }
        }
        Ok(())
    }

    fn check_fits(&self, dim: usize) -> SimResult<()> {
        let required = self.num_qubits();
        if required > 0 && (required >= usize::BITS as usize || (1usize << required) > dim) {
            return Err(SimError::QubitOutOfRange {
                required,
                available: dim.trailing_zeros() as usize,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for PauliHamiltonian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Hamiltonian ({} terms, {} qubits):",
            self.num_terms(),
            self.num_qubits()
        )?;
        for term in &self.terms {
            writeln!(f, "  {}", term)?;
        }
        Ok(())
    }
}

/// Calculate the expectation value `⟨ψ|H|ψ⟩` of a Hamiltonian.
pub fn expectation_value(hamiltonian: &PauliHamiltonian, state: &Statevector) -> SimResult<f64> {
    let amplitudes = state.amplitudes();
    hamiltonian.check_fits(amplitudes.len())?;

    let mut energy = 0.0;
    for term in &hamiltonian.terms {
        let mut term_value = Complex64::new(0.0, 0.0);
        for (i, &amplitude) in amplitudes.iter().enumerate() {
            let (j, phase) = term.apply_to_basis(i);
            term_value += amplitudes[j].conj() * phase * amplitude;
        }
        energy += term.coefficient * term_value.re;
    }

    Ok(energy)
}
