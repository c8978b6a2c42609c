//! Parameter expressions for parameterized circuits.
//!
//! Ansatz circuits refer to the optimizer's parameter vector through numbered
//! slots. A gate angle may be an arithmetic expression of a slot, e.g. the
//! `π/2 − γ` rotation inside the XX+YY+ZZ block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// The value of slot `i` of the parameter vector.
    Parameter(usize),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a reference to parameter slot `index`.
    pub fn parameter(index: usize) -> Self {
        ParameterExpression::Parameter(index)
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check if this expression references any parameter slot.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Parameter(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    ///
    /// Returns `None` if the expression references a parameter slot or
    /// divides by zero.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Parameter(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
        }
    }

    /// Evaluate the expression against a parameter vector.
    pub fn evaluate(&self, values: &[f64]) -> IrResult<f64> {
        let value = match self {
            ParameterExpression::Constant(v) => *v,
            ParameterExpression::Parameter(i) => {
                *values.get(*i).ok_or(IrError::UnboundParameter(*i))?
            }
            ParameterExpression::Pi => PI,
            ParameterExpression::Neg(e) => -e.evaluate(values)?,
            ParameterExpression::Add(a, b) => a.evaluate(values)? + b.evaluate(values)?,
            ParameterExpression::Sub(a, b) => a.evaluate(values)? - b.evaluate(values)?,
            ParameterExpression::Mul(a, b) => a.evaluate(values)? * b.evaluate(values)?,
            ParameterExpression::Div(a, b) => a.evaluate(values)? / b.evaluate(values)?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(IrError::NonFinite(self.to_string()))
        }
    }

    /// Substitute the parameter vector, returning a constant expression.
    pub fn bind(&self, values: &[f64]) -> IrResult<Self> {
        self.evaluate(values).map(ParameterExpression::Constant)
    }

    /// Get all parameter slots referenced by this expression.
    pub fn parameters(&self) -> BTreeSet<usize> {
        let mut set = BTreeSet::new();
        self.collect_parameters(&mut set);
        set
    }

    fn collect_parameters(&self, set: &mut BTreeSet<usize>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Parameter(i) => {
                set.insert(*i);
            }
            ParameterExpression::Neg(e) => e.collect_parameters(set),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => {
                a.collect_parameters(set);
                b.collect_parameters(set);
            }
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Parameter(i) => write!(f, "θ{i}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl std::ops::$trait for ParameterExpression {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                ParameterExpression::$variant(Box::new(self), Box::new(rhs))
            }
        }

        impl std::ops::$trait<f64> for ParameterExpression {
            type Output = Self;

            fn $method(self, rhs: f64) -> Self::Output {
                ParameterExpression::$variant(
                    Box::new(self),
                    Box::new(ParameterExpression::Constant(rhs)),
                )
            }
        }

        impl std::ops::$trait<ParameterExpression> for f64 {
            type Output = ParameterExpression;

            fn $method(self, rhs: ParameterExpression) -> Self::Output {
                ParameterExpression::$variant(
                    Box::new(ParameterExpression::Constant(self)),
                    Box::new(rhs),
                )
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
    }

    #[test]
    fn test_parameter_slot() {
        let p = ParameterExpression::parameter(3);
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.parameters().into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_affine_evaluation() {
        // π/2 − θ1
        let expr = ParameterExpression::pi() / 2.0 - ParameterExpression::parameter(1);
        let value = expr.evaluate(&[0.0, 0.5]).unwrap();
        assert!((value - (PI / 2.0 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_evaluation() {
        let expr = -2.0 * ParameterExpression::parameter(0);
        assert_eq!(expr.evaluate(&[0.25]).unwrap(), -0.5);
    }

    #[test]
    fn test_unbound_slot() {
        let expr = ParameterExpression::parameter(4);
        assert!(matches!(
            expr.evaluate(&[1.0, 2.0]),
            Err(IrError::UnboundParameter(4))
        ));
    }

    #[test]
    fn test_division_by_zero_is_not_finite() {
        let expr = ParameterExpression::parameter(0) / 0.0;
        assert!(matches!(expr.evaluate(&[1.0]), Err(IrError::NonFinite(_))));
        assert_eq!((ParameterExpression::constant(1.0) / 0.0).as_f64(), None);
    }

    #[test]
    fn test_display() {
        let expr = ParameterExpression::parameter(2) - ParameterExpression::pi() / 2.0;
        assert_eq!(expr.to_string(), "(θ2 - (π / 2))");
    }
}
