//! Two-qubit quantum compiling problem.
//!
//! A target unitary `Ry(a)⊗I → CX → I⊗Ry(b)` is approximated by an
//! overparameterized circuit of eleven parameters per layer.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex64;
use qlt_ir::{Circuit, ParameterExpression, QubitId};
use qlt_sim::unitary;

use crate::error::ModelResult;

/// Parameters per overparameterized layer.
pub const PARAMETERS_PER_LAYER: usize = 11;

/// Period of every compiling parameter.
///
/// The XX power gate exponent is `θ/(2π)`, which makes all parameters
/// share a `4π` period.
pub const COMPILING_PARAMETER_PERIOD: f64 = 4.0 * PI;

/// Number of parameters of the overparameterized compiling circuit.
pub fn compiling_num_parameters(layers: usize) -> usize {
    PARAMETERS_PER_LAYER * layers
}

/// The target circuit for parameters `(a, b)`.
pub fn compiling_target_circuit(a: f64, b: f64) -> ModelResult<Circuit> {
    let mut circuit = Circuit::with_size("compiling_target", 2);
    circuit.ry(a, QubitId(0))?;
    circuit.cx(QubitId(0), QubitId(1))?;
    circuit.ry(b, QubitId(1))?;
    Ok(circuit)
}

/// The target unitary for parameters `(a, b)`.
pub fn compiling_target(a: f64, b: f64) -> ModelResult<Array2<Complex64>> {
    Ok(unitary(&compiling_target_circuit(a, b)?)?)
}

/// Build the symbolic overparameterized compiling circuit.
pub fn compiling_overparameterized(layers: usize) -> ModelResult<Circuit> {
    let q0 = QubitId(0);
    let q1 = QubitId(1);
    let mut circuit = Circuit::with_size("compiling_overparameterized", 2)
        .with_declared_parameters(compiling_num_parameters(layers));

    for layer in 0..layers {
        let p = |offset: usize| ParameterExpression::parameter(PARAMETERS_PER_LAYER * layer + offset);
        circuit.ry(p(0), q0)?;
        circuit.ry(p(1), q1)?;
        circuit.cx(q0, q1)?;
        circuit.ry(p(2), q0)?;
        circuit.ry(p(3), q1)?;
        circuit.rz(p(4), q0)?;
        circuit.rz(p(5), q1)?;
        circuit.xx_pow(p(6) / (2.0 * PI), q0, q1)?;
        circuit.ry(p(7), q0)?;
        circuit.ry(p(8), q1)?;
        circuit.rz(p(9), q0)?;
        circuit.rz(p(10), q1)?;
    }

    Ok(circuit)
}

/// The two reference parameter vectors built from the target's angles.
///
/// Both place `a` on the first Ry of qubit 0. The first puts `b` on the
/// Ry of qubit 1 right after the CNOT, the second on the final Ry of
/// qubit 1. All other entries, including later layers, are zero. Each
/// zeroed layer still applies its CNOT, so the vectors reproduce the
/// target exactly only for an odd number of layers.
pub fn trivial_parameters(a: f64, b: f64, layers: usize) -> [Vec<f64>; 2] {
    let n = compiling_num_parameters(layers);
    let mut first = vec![0.0; n];
    let mut second = vec![0.0; n];
    if layers > 0 {
        first[0] = a;
        first[3] = b;
        second[0] = a;
        second[8] = b;
    }
    [first, second]
}
