//! Property-based tests for parameter pruning.

use proptest::prelude::*;
use qlt_prune::{
    PAD_VALUE, indices_by_percentage, indices_within_cutoff, pad, periodic_distance, prune,
    weight_decay_bias,
};
use std::f64::consts::PI;

const PERIOD: f64 = 2.0 * PI;

/// A parameter vector and a sorted, unique subset of its indices.
fn arb_vector_and_indices() -> impl Strategy<Value = (Vec<f64>, Vec<usize>)> {
    prop::collection::vec(-20.0_f64..20.0, 0..40).prop_flat_map(|params| {
        let len = params.len();
        (
            Just(params),
            prop::collection::vec(any::<bool>(), len).prop_map(|mask| {
                mask.into_iter()
                    .enumerate()
                    .filter(|(_, pruned)| *pruned)
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>()
            }),
        )
    })
}

proptest! {
    #[test]
    fn distance_is_shift_invariant(x in -100.0_f64..100.0, k in -20_i32..20) {
        let shifted = x + f64::from(k) * PERIOD;
        prop_assert!((periodic_distance(x, PERIOD) - periodic_distance(shifted, PERIOD)).abs() < 1e-9);
    }

    #[test]
    fn distance_is_bounded(x in -1e4_f64..1e4) {
        let d = periodic_distance(x, PERIOD);
        prop_assert!((0.0..=PERIOD / 2.0).contains(&d));
    }

    #[test]
    fn prune_then_pad_keeps_survivors((params, indices) in arb_vector_and_indices()) {
        let kept = prune(&params, &indices).unwrap();
        prop_assert_eq!(kept.len(), params.len() - indices.len());

        let padded = pad(&kept, &indices).unwrap();
        prop_assert_eq!(padded.len(), params.len());
        for (i, value) in padded.iter().enumerate() {
            if indices.contains(&i) {
                prop_assert_eq!(*value, PAD_VALUE);
            } else {
                prop_assert_eq!(*value, params[i]);
            }
        }
    }

    #[test]
    fn pad_then_prune_is_identity((params, indices) in arb_vector_and_indices()) {
        let kept = prune(&params, &indices).unwrap();
        let padded = pad(&kept, &indices).unwrap();
        prop_assert_eq!(prune(&padded, &indices).unwrap(), kept);
    }

    #[test]
    fn percentage_selection_is_sorted_and_sized(
        params in prop::collection::vec(-10.0_f64..10.0, 0..50),
        fraction in 0.0_f64..=1.0,
    ) {
        let indices = indices_by_percentage(&params, fraction, PERIOD).unwrap();
        let expected = ((params.len() as f64) * fraction).ceil() as usize;
        prop_assert_eq!(indices.len(), expected.min(params.len()));
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));

        // nothing left behind is closer to zero than what was taken
        let worst_taken = indices
            .iter()
            .map(|i| periodic_distance(params[*i], PERIOD))
            .fold(0.0, f64::max);
        for (i, p) in params.iter().enumerate() {
            if !indices.contains(&i) {
                prop_assert!(periodic_distance(*p, PERIOD) >= worst_taken);
            }
        }
    }

    #[test]
    fn cutoff_selection_matches_distance(
        params in prop::collection::vec(-10.0_f64..10.0, 0..50),
        cutoff in 0.0_f64..PI,
    ) {
        let indices = indices_within_cutoff(&params, cutoff, PERIOD).unwrap();
        for (i, p) in params.iter().enumerate() {
            prop_assert_eq!(indices.contains(&i), periodic_distance(*p, PERIOD) <= cutoff);
        }
    }

    #[test]
    fn weight_decay_bias_is_bounded(
        params in prop::collection::vec(-10.0_f64..10.0, 1..30),
        weight_decay in 0.0_f64..100.0,
    ) {
        let bias = weight_decay_bias(&params, weight_decay, PERIOD).unwrap();
        prop_assert!(bias >= 0.0);
        prop_assert!(bias <= weight_decay + 1e-9);
    }
}
