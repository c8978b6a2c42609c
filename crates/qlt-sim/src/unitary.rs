//! Dense unitary construction for small circuits.

use ndarray::Array2;
use num_complex::Complex64;

use qlt_ir::Circuit;

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Largest register [`unitary`] will expand into a dense matrix.
const MAX_UNITARY_QUBITS: usize = 12;

/// Build the full unitary of a bound circuit.
///
/// Column `j` holds `U|j⟩`, with the same basis ordering as [`Statevector`].
pub fn unitary(circuit: &Circuit) -> SimResult<Array2<Complex64>> {
    let n = circuit.num_qubits();
    if n > MAX_UNITARY_QUBITS {
        return Err(SimError::TooManyQubits {
            requested: n,
            max: MAX_UNITARY_QUBITS,
        });
    }

    let dim = 1 << n;
    let mut matrix = Array2::zeros((dim, dim));
    for j in 0..dim {
        let mut column = Statevector::basis_state(n, j)?;
        column.run(circuit)?;
        for (i, amp) in column.into_amplitudes().into_iter().enumerate() {
            matrix[[i, j]] = amp;
        }
    }
    Ok(matrix)
}

/// Frobenius norm of `a − b`.
pub fn frobenius_distance(a: &Array2<Complex64>, b: &Array2<Complex64>) -> SimResult<f64> {
    if a.dim() != b.dim() {
        return Err(SimError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm_sqr())
        .sum::<f64>()
        .sqrt())
}
