//! Optimize, prune, and re-optimize the pruned circuit from its original
//! initialization.

use qlt_cost::{CostFunction, JsonlTracker, RunRecord, VqeCost, minimize, read_run};
use qlt_models::circuits::j1j2_alternating_ansatz;
use qlt_models::problems::{ground_state_energy, j1j2_hamiltonian};
use qlt_optimize::Lbfgsb;
use qlt_prune::{PruningRule, prune, select};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

#[test]
fn pruned_rerun_keeps_energy_above_ground_state() {
    let hamiltonian = j1j2_hamiltonian(3, 1.25, 1.0);
    let e0 = ground_state_energy(&hamiltonian).unwrap();
    let ansatz = j1j2_alternating_ansatz(3, 2).unwrap();
    let optimizer = Lbfgsb::new().with_ftol(1e-10);

    let mut rng = StdRng::seed_from_u64(1234 + 17 * 2);
    let initial: Vec<f64> = (0..ansatz.num_parameters())
        .map(|_| rng.gen_range(-PI..PI))
        .collect();

    let mut unpruned = VqeCost::new(hamiltonian.clone(), ansatz.clone()).with_offset(-e0);
    let first = minimize(&optimizer, &mut unpruned, initial.clone()).unwrap();
    assert!(first.optimal_value >= -1e-9);

    let rule = PruningRule::Percentage { fraction: 0.5 };
    let pruned_indices = select(&first.optimal_params, &rule, 2.0 * PI).unwrap();
    assert_eq!(pruned_indices.len(), 6);

    let mut pruned = VqeCost::new(hamiltonian, ansatz)
        .with_offset(-e0)
        .with_pruned_indices(pruned_indices.clone())
        .unwrap();
    assert_eq!(pruned.num_parameters(), 6);

    let start = prune(&initial, &pruned_indices).unwrap();
    let second = minimize(&optimizer, &mut pruned, start).unwrap();
    assert!(second.optimal_value >= -1e-9);
    assert_eq!(second.optimal_params.len(), 6);
}

#[test]
fn tracked_run_writes_every_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let hamiltonian = j1j2_hamiltonian(2, 0.0, 1.0);
    let ansatz = j1j2_alternating_ansatz(2, 1).unwrap();

    let tracker = JsonlTracker::create(
        dir.path(),
        "QLT-VQE-J1J2",
        serde_json::json!({"type": "unpruned", "trial": 0}),
    )
    .unwrap();
    let path = tracker.path().to_path_buf();

    let mut cost = VqeCost::new(hamiltonian, ansatz)
        .with_weight_decay(0.1)
        .with_tracker(tracker);
    let result = minimize(&Lbfgsb::new(), &mut cost, vec![0.2; 6]).unwrap();

    let records = read_run(&path).unwrap();
    assert_eq!(records.len(), result.num_evaluations + 2);
    assert!(matches!(records.first(), Some(RunRecord::Run { .. })));
    match records.last() {
        Some(RunRecord::Finish { steps, .. }) => assert_eq!(*steps, result.num_evaluations),
        other => panic!("unexpected last record {other:?}"),
    }
}
