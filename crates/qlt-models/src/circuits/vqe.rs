//! VQE ansatz circuits.
//!
//! Every generator returns a symbolic circuit over parameter slots
//! `θ₀ … θₖ₋₁`, where `k` is given by the matching `*_num_parameters`
//! function. The circuit is bound to a concrete vector per evaluation.

use qlt_ir::{Circuit, ParameterExpression, QubitId};

use super::blocks::{xx_yy_zz_block, zz_block};
use crate::error::{ModelError, ModelResult};

fn theta(slot: usize) -> ParameterExpression {
    ParameterExpression::parameter(slot)
}

fn qubit(index: usize) -> QubitId {
    QubitId::from(index)
}

fn require_qubits(model: &'static str, min: usize, got: usize) -> ModelResult<()> {
    if got < min {
        return Err(ModelError::TooFewQubits { model, min, got });
    }
    Ok(())
}

/// Parameters used by [`j1j2_alternating_ansatz`]: `6 · layers`.
pub fn j1j2_alternating_num_parameters(layers: usize) -> usize {
    6 * layers
}

/// Variational Hamiltonian ansatz for the J1-J2 chain with shared angles.
///
/// A Hadamard layer is followed, per layer, by an `XX+YY+ZZ` block on every
/// nearest-neighbour pair sharing one `(α, β, γ)` triple, then a block on
/// every next-nearest pair sharing a second triple.
pub fn j1j2_alternating_ansatz(n_qubits: usize, layers: usize) -> ModelResult<Circuit> {
    require_qubits("j1j2_alternating", 2, n_qubits)?;

    let mut circuit = Circuit::with_size("j1j2_alternating", n_qubits as u32)
        .with_declared_parameters(j1j2_alternating_num_parameters(layers));

    for q in 0..n_qubits {
        circuit.h(qubit(q))?;
    }

    let mut slot = 0;
    for _ in 0..layers {
        for distance in [1, 2] {
            for q in 0..n_qubits.saturating_sub(distance) {
                xx_yy_zz_block(
                    &mut circuit,
                    qubit(q),
                    qubit(q + distance),
                    theta(slot),
                    theta(slot + 1),
                    theta(slot + 2),
                )?;
            }
            slot += 3;
        }
    }

    Ok(circuit)
}

/// Parameters used by [`j1j2_full_ansatz`]: `(3(2n − 3) + n) · layers`.
pub fn j1j2_full_num_parameters(n_qubits: usize, layers: usize) -> usize {
    (3 * (2 * n_qubits).saturating_sub(3) + n_qubits) * layers
}

/// Fully parameterized J1-J2 ansatz.
///
/// Like [`j1j2_alternating_ansatz`] but every pair gets its own angle
/// triple, and each layer ends with an independent Rx on every qubit.
pub fn j1j2_full_ansatz(n_qubits: usize, layers: usize) -> ModelResult<Circuit> {
    require_qubits("j1j2_full", 2, n_qubits)?;

    let mut circuit = Circuit::with_size("j1j2_full", n_qubits as u32)
        .with_declared_parameters(j1j2_full_num_parameters(n_qubits, layers));

    for q in 0..n_qubits {
        circuit.h(qubit(q))?;
    }

    let mut slot = 0;
    for _ in 0..layers {
        for distance in [1, 2] {
            for q in 0..n_qubits.saturating_sub(distance) {
                xx_yy_zz_block(
                    &mut circuit,
                    qubit(q),
                    qubit(q + distance),
                    theta(slot),
                    theta(slot + 1),
                    theta(slot + 2),
                )?;
                slot += 3;
            }
        }
        for q in 0..n_qubits {
            circuit.rx(theta(slot), qubit(q))?;
            slot += 1;
        }
    }

    Ok(circuit)
}

/// Parameters used by [`tfim_ansatz`]: `2 · layers`.
pub fn tfim_num_parameters(layers: usize) -> usize {
    2 * layers
}

/// Overparameterized TFIM ansatz (Larocca et al., Fig. 7).
///
/// After a Hadamard layer, layer `l` applies a ZZ block with angle
/// `θ_{2l}` to the even pairs then the odd pairs, followed by
/// `Rx(θ_{2l+1})` on every qubit.
pub fn tfim_ansatz(n_qubits: usize, layers: usize) -> ModelResult<Circuit> {
    require_qubits("tfim", 1, n_qubits)?;

    let mut circuit = Circuit::with_size("tfim", n_qubits as u32)
        .with_declared_parameters(tfim_num_parameters(layers));

    for q in 0..n_qubits {
        circuit.h(qubit(q))?;
    }

    for layer in 0..layers {
        let even_pairs = (0..n_qubits.saturating_sub(1)).step_by(2);
        let odd_pairs = (1..n_qubits.saturating_sub(1)).step_by(2);
        for q in even_pairs.chain(odd_pairs) {
            zz_block(&mut circuit, qubit(q), qubit(q + 1), theta(2 * layer))?;
        }
        for q in 0..n_qubits {
            circuit.rx(theta(2 * layer + 1), qubit(q))?;
        }
    }

    Ok(circuit)
}

/// Parameters used by [`two_qubit_overparameterized_ansatz`]: `15 · layers`.
pub fn two_qubit_overparameterized_num_parameters(layers: usize) -> usize {
    15 * layers
}

/// Two-qubit ansatz: Ry·Rz·Ry on each qubit, an `XX+YY+ZZ` block, then
/// Ry·Rz·Ry on each qubit again.
pub fn two_qubit_overparameterized_ansatz(layers: usize) -> ModelResult<Circuit> {
    let mut circuit = Circuit::with_size("two_qubit_overparameterized", 2)
        .with_declared_parameters(two_qubit_overparameterized_num_parameters(layers));

    fn euler_layer(circuit: &mut Circuit, slot: &mut usize) -> ModelResult<()> {
        for q in 0..2 {
            circuit.ry(theta(*slot), qubit(q))?;
            circuit.rz(theta(*slot + 1), qubit(q))?;
            circuit.ry(theta(*slot + 2), qubit(q))?;
            *slot += 3;
        }
        Ok(())
    }

    let mut slot = 0;
    for _ in 0..layers {
        euler_layer(&mut circuit, &mut slot)?;
        xx_yy_zz_block(
            &mut circuit,
            qubit(0),
            qubit(1),
            theta(slot),
            theta(slot + 1),
            theta(slot + 2),
        )?;
        slot += 3;
        euler_layer(&mut circuit, &mut slot)?;
    }

    Ok(circuit)
}
