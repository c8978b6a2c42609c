//! Circular distances and the weight-decay penalty built on them.

use crate::error::{PruneError, PruneResult};

/// Check that `period` can be used as a parameter period.
pub fn check_period(period: f64) -> PruneResult<()> {
    if period.is_finite() && period > 0.0 {
        Ok(())
    } else {
        Err(PruneError::InvalidPeriod(period))
    }
}

/// Distance of `parameter` from the nearest multiple of `period`.
///
/// The result lies in `[0, period / 2]` and is unchanged by shifting
/// `parameter` by any whole number of periods.
///
/// ```rust
/// use qlt_prune::periodic_distance;
/// use std::f64::consts::PI;
///
/// assert!((periodic_distance(2.0 * PI - 0.1, 2.0 * PI) - 0.1).abs() < 1e-12);
/// assert!((periodic_distance(-0.1, 2.0 * PI) - 0.1).abs() < 1e-12);
/// ```
pub fn periodic_distance(parameter: f64, period: f64) -> f64 {
    let r = parameter.rem_euclid(period);
    r.min(period - r)
}

/// Weight-decay penalty of a full parameter vector.
///
/// `weight_decay · Σ dᵢ² / Σ (period/2)²` with `dᵢ` the periodic distance of
/// parameter `i`. The ratio lies in `[0, 1]`, so the penalty never exceeds
/// `weight_decay`. Empty input gives zero. Fails on a period rejected by
/// [`check_period`].
pub fn weight_decay_bias(parameters: &[f64], weight_decay: f64, period: f64) -> PruneResult<f64> {
    check_period(period)?;
    if parameters.is_empty() || weight_decay == 0.0 {
        return Ok(0.0);
    }
    let max_distance = period / 2.0;
    let numerator: f64 = parameters
        .iter()
        .map(|p| periodic_distance(*p, period).powi(2))
        .sum();
    let denominator = parameters.len() as f64 * max_distance * max_distance;
    Ok(weight_decay * numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_periodic_distance_wraps() {
        let period = 2.0 * PI;
        assert_relative_eq!(periodic_distance(0.0, period), 0.0);
        assert_relative_eq!(periodic_distance(period, period), 0.0, epsilon = 1e-12);
        assert_relative_eq!(periodic_distance(PI, period), PI, epsilon = 1e-12);
        assert_relative_eq!(periodic_distance(-0.3, period), 0.3, epsilon = 1e-12);
        assert_relative_eq!(
            periodic_distance(7.0 * period + 0.25, period),
            0.25,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_check_period() {
        assert!(check_period(2.0 * PI).is_ok());
        assert_eq!(check_period(0.0), Err(PruneError::InvalidPeriod(0.0)));
        assert!(check_period(-1.0).is_err());
        assert!(check_period(f64::NAN).is_err());
        assert!(check_period(f64::INFINITY).is_err());
    }

    #[test]
    fn test_weight_decay_bias_extremes() {
        let period = 2.0 * PI;
        assert_eq!(weight_decay_bias(&[], 10.0, period), Ok(0.0));
        assert_relative_eq!(
            weight_decay_bias(&[0.0, period], 10.0, period).unwrap(),
            0.0,
            epsilon = 1e-12
        );
        // every parameter at the maximal distance saturates the penalty
        assert_relative_eq!(
            weight_decay_bias(&[PI, -PI, 3.0 * PI], 50.0, period).unwrap(),
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_weight_decay_bias_mixed() {
        let period = 4.0;
        // distances 1 and 2 over max 2: (1 + 4) / (4 + 4)
        let bias = weight_decay_bias(&[1.0, 2.0], 8.0, period).unwrap();
        assert_relative_eq!(bias, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_weight_decay() {
        assert_eq!(weight_decay_bias(&[1.0, 2.0, 3.0], 0.0, 2.0 * PI), Ok(0.0));
    }

    #[test]
    fn test_weight_decay_bias_rejects_bad_period() {
        for period in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                weight_decay_bias(&[1.0, 2.0], 1.0, period),
                Err(PruneError::InvalidPeriod(_))
            ));
        }
        // checked even when the penalty would vanish
        assert!(weight_decay_bias(&[], 0.0, 0.0).is_err());
    }
}
