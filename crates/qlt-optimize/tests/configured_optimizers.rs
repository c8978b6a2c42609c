//! Every configured optimizer reaches the minimum of a smooth periodic cost.

use qlt_optimize::{Optimizer, OptimizerConfig, OptimizerKind};

/// Minimum −3 at (0.3, −0.2, 0.1), in the spirit of a rotation-angle cost.
fn periodic_bowl(x: &[f64]) -> f64 {
    -(x[0] - 0.3).cos() - (x[1] + 0.2).cos() - (x[2] - 0.1).cos()
}

#[test]
fn all_optimizers_find_periodic_minimum() {
    for kind in OptimizerKind::ALL {
        let mut config = OptimizerConfig::for_kind(kind);
        config.cma_es.sigma0 = 0.2;
        config.cobyla.maxiter = 5000;
        config.cobyla.tol = 1e-10;
        config.cobyla.rhoend = 1e-6;

        let result = config.build(1234).minimize(periodic_bowl, vec![0.8, 0.6, -0.7]);
        assert!(
            result.optimal_value < -3.0 + 1e-4,
            "{kind}: {} ({})",
            result.optimal_value,
            result.message
        );
        assert_eq!(result.optimal_params.len(), 3);
        assert!(result.num_evaluations > 0);
    }
}

#[test]
fn history_never_increases() {
    for kind in OptimizerKind::ALL {
        let result = OptimizerConfig::for_kind(kind)
            .build(5)
            .minimize(periodic_bowl, vec![1.0, 1.0, 1.0]);
        assert!(
            result.history.windows(2).all(|w| w[1] <= w[0] + 1e-12),
            "{kind} history increased"
        );
    }
}
