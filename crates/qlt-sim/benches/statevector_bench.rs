//! Benchmarks for statevector simulation
//!
//! Run with: cargo bench -p qlt-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qlt_ir::{Circuit, ParameterExpression, QubitId};
use qlt_sim::{PauliHamiltonian, PauliTerm, Statevector, expectation_value};

/// Hardware-efficient layer: Ry on every qubit, then an Rxx ladder.
fn layered_circuit(n: u32, layers: usize) -> Circuit {
    let mut circuit = Circuit::with_size("bench", n);
    let mut slot = 0;
    for _ in 0..layers {
        for q in 0..n {
            circuit
                .ry(ParameterExpression::parameter(slot), QubitId(q))
                .unwrap();
            slot += 1;
        }
        for q in 0..n - 1 {
            circuit
                .rxx(ParameterExpression::parameter(slot), QubitId(q), QubitId(q + 1))
                .unwrap();
            slot += 1;
        }
    }
    circuit
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("statevector");

    for num_qubits in &[4u32, 8, 12] {
        let circuit = layered_circuit(*num_qubits, 4);
        let params: Vec<f64> = (0..circuit.num_parameters()).map(|i| 0.1 * i as f64).collect();

        group.bench_with_input(
            BenchmarkId::new("bind_and_run", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| Statevector::from_parameterized(black_box(circuit), black_box(&params)));
            },
        );
    }

    group.finish();
}

fn bench_expectation(c: &mut Criterion) {
    let mut group = c.benchmark_group("expectation");

    for num_qubits in &[4usize, 8, 12] {
        let terms = (0..num_qubits - 1)
            .flat_map(|q| {
                [
                    PauliTerm::xx(1.0, q, q + 1),
                    PauliTerm::yy(1.0, q, q + 1),
                    PauliTerm::zz(1.0, q, q + 1),
                ]
            })
            .collect();
        let hamiltonian = PauliHamiltonian::new(terms);
        let circuit = layered_circuit(*num_qubits as u32, 2);
        let params = vec![0.3; circuit.num_parameters()];
        let state = Statevector::from_parameterized(&circuit, &params).unwrap();

        group.bench_with_input(
            BenchmarkId::new("heisenberg_chain", num_qubits),
            &state,
            |b, state| {
                b.iter(|| expectation_value(black_box(&hamiltonian), black_box(state)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_simulation, bench_expectation);
criterion_main!(benches);
