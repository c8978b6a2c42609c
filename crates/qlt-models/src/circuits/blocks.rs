//! Two-qubit building blocks shared by the ansätze.

use qlt_ir::{Circuit, ParameterExpression, QubitId};

use crate::error::ModelResult;

/// Append `exp(i/2 · (α X⊗X + β Y⊗Y + γ Z⊗Z))` using three CNOTs.
///
/// Equal up to global phase. Each of α, β, γ has period 2π.
pub fn xx_yy_zz_block(
    circuit: &mut Circuit,
    q1: QubitId,
    q2: QubitId,
    alpha: ParameterExpression,
    beta: ParameterExpression,
    gamma: ParameterExpression,
) -> ModelResult<()> {
    let half_pi = || ParameterExpression::pi() / 2.0;
    let theta = half_pi() - gamma;
    let phi = alpha - half_pi();
    let omega = half_pi() - beta;

    circuit.rz(-half_pi(), q2)?;
    circuit.cx(q2, q1)?;
    circuit.rz(theta, q1)?;
    circuit.ry(phi, q2)?;
    circuit.cx(q1, q2)?;
    circuit.ry(omega, q2)?;
    circuit.cx(q2, q1)?;
    circuit.rz(half_pi(), q1)?;
    Ok(())
}

/// Append `exp(iγ Z⊗Z)` as `CX · Rz(−2γ) · CX`.
pub fn zz_block(
    circuit: &mut Circuit,
    q1: QubitId,
    q2: QubitId,
    gamma: ParameterExpression,
) -> ModelResult<()> {
    circuit.cx(q1, q2)?;
    circuit.rz(-2.0 * gamma, q2)?;
    circuit.cx(q1, q2)?;
    Ok(())
}
