//! The cost-function abstraction and its optimization driver.

use qlt_optimize::{OptimizationResult, Optimizer};
use tracing::warn;

use crate::error::{CostError, CostResult};

/// A scalar cost over the unpruned parameters of a circuit.
pub trait CostFunction {
    /// Number of parameters `evaluate` expects.
    fn num_parameters(&self) -> usize;

    /// Cost at `params`.
    fn evaluate(&mut self, params: &[f64]) -> CostResult<f64>;

    /// Close any tracking run. Called once the optimization is over.
    fn finish(&mut self) -> CostResult<()> {
        Ok(())
    }
}

pub(crate) fn check_parameter_count(expected: usize, params: &[f64]) -> CostResult<()> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(CostError::ParameterCountMismatch {
            expected,
            got: params.len(),
        })
    }
}

/// Minimize `cost` from `initial` with `optimizer`.
///
/// The first evaluation error aborts the run: the optimizer sees `+∞` for
/// that point and every later one, and the error is returned once it stops.
pub fn minimize<O, C>(
    optimizer: &O,
    cost: &mut C,
    initial: Vec<f64>,
) -> CostResult<OptimizationResult>
where
    O: Optimizer + ?Sized,
    C: CostFunction + ?Sized,
{
    if initial.len() != cost.num_parameters() {
        return Err(CostError::ParameterCountMismatch {
            expected: cost.num_parameters(),
            got: initial.len(),
        });
    }

    let mut failure: Option<CostError> = None;
    let result = optimizer.minimize(
        |params| {
            if failure.is_some() {
                return f64::INFINITY;
            }
            match cost.evaluate(params) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Cost evaluation failed: {}", e);
                    failure = Some(e);
                    f64::INFINITY
                }
            }
        },
        initial,
    );

    cost.finish()?;
    match failure {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlt_optimize::Lbfgsb;

    struct Shifted {
        calls: usize,
        fail_after: Option<usize>,
        finished: bool,
    }

    impl CostFunction for Shifted {
        fn num_parameters(&self) -> usize {
            2
        }

        fn evaluate(&mut self, params: &[f64]) -> CostResult<f64> {
            check_parameter_count(2, params)?;
            self.calls += 1;
            if self.fail_after.is_some_and(|n| self.calls > n) {
                return Err(CostError::InvalidTarget("boom".to_string()));
            }
            Ok((params[0] - 1.0).powi(2) + params[1].powi(2))
        }

        fn finish(&mut self) -> CostResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn test_minimize_finishes_cost() {
        let mut cost = Shifted {
            calls: 0,
            fail_after: None,
            finished: false,
        };
        let result = minimize(&Lbfgsb::new(), &mut cost, vec![0.0, 0.5]).unwrap();
        assert!((result.optimal_params[0] - 1.0).abs() < 1e-4);
        assert!(cost.finished);
        assert_eq!(cost.calls, result.num_evaluations);
    }

    #[test]
    fn test_minimize_propagates_first_error() {
        let mut cost = Shifted {
            calls: 0,
            fail_after: Some(3),
            finished: false,
        };
        let err = minimize(&Lbfgsb::new(), &mut cost, vec![0.0, 0.5]).unwrap_err();
        assert!(matches!(err, CostError::InvalidTarget(_)));
        // later points are never evaluated
        assert_eq!(cost.calls, 4);
        assert!(cost.finished);
    }

    #[test]
    fn test_minimize_rejects_wrong_length() {
        let mut cost = Shifted {
            calls: 0,
            fail_after: None,
            finished: false,
        };
        assert!(matches!(
            minimize(&Lbfgsb::new(), &mut cost, vec![0.0]),
            Err(CostError::ParameterCountMismatch { expected: 2, got: 1 })
        ));
    }
}
