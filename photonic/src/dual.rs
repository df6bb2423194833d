//! Forward-mode dual numbers.
//!
//! Every amplitude and probability the simulator produces is a [`Dual`]: a value plus the
//! gradient of that value with respect to the tunable circuit parameters. Constants carry an
//! empty gradient, so the non-differentiable backends run the exact same formulas at the cost
//! of an empty `Vec` per number.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Div, Mul, Neg, Sub};

use itertools::{EitherOrBoth, Itertools};

/// A scalar with an optional gradient channel.
///
/// Gradients of different lengths combine as if the shorter one were padded with zeros.
///
/// # Examples
///
/// ```
/// use photonic::Dual;
///
/// let x = Dual::variable(3.0, 0, 1);
/// let y = &x * &x + 1.0;
/// assert_eq!(y.value(), 10.0);
/// assert_eq!(y.gradient(), Some(&[6.0][..]));
/// assert_eq!(Dual::constant(2.0).gradient(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dual {
    value: f64,
    gradient: Vec<f64>,
}

impl Dual {
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Dual {
            value,
            gradient: Vec::new(),
        }
    }

    /// The `index`-th of `dimension` independent variables, currently at `value`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `index < dimension`.
    #[must_use]
    pub fn variable(value: f64, index: usize, dimension: usize) -> Self {
        debug_assert!(index < dimension, "variable {index} out of {dimension}");
        let mut gradient = vec![0.0; dimension];
        gradient[index] = 1.0;
        Dual { value, gradient }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The gradient, or `None` when the number does not depend on any variable.
    #[must_use]
    pub fn gradient(&self) -> Option<&[f64]> {
        (!self.gradient.is_empty()).then_some(self.gradient.as_slice())
    }

    /// Partial derivative with respect to variable `index`; zero when untracked.
    #[must_use]
    pub fn partial(&self, index: usize) -> f64 {
        self.gradient.get(index).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.gradient.is_empty()
    }

    #[must_use]
    pub fn exp(&self) -> Self {
        let value = self.value.exp();
        self.chain(value, value)
    }

    #[must_use]
    pub fn sqrt(&self) -> Self {
        let value = self.value.sqrt();
        self.chain(value, 0.5 / value)
    }

    #[must_use]
    pub fn cosh(&self) -> Self {
        self.chain(self.value.cosh(), self.value.sinh())
    }

    #[must_use]
    pub fn sinh(&self) -> Self {
        self.chain(self.value.sinh(), self.value.cosh())
    }

    #[must_use]
    pub fn square(&self) -> Self {
        self.chain(self.value * self.value, 2.0 * self.value)
    }

    fn chain(&self, value: f64, derivative: f64) -> Self {
        Dual {
            value,
            gradient: self.gradient.iter().map(|partial| partial * derivative).collect(),
        }
    }

    fn combine(&self, other: &Self, value: f64, self_weight: f64, other_weight: f64) -> Self {
        let gradient = self
            .gradient
            .iter()
            .zip_longest(&other.gradient)
            .map(|pair| match pair {
                EitherOrBoth::Both(left, right) => self_weight * left + other_weight * right,
                EitherOrBoth::Left(left) => self_weight * left,
                EitherOrBoth::Right(right) => other_weight * right,
            })
            .collect();
        Dual { value, gradient }
    }
}

impl From<f64> for Dual {
    fn from(value: f64) -> Self {
        Dual::constant(value)
    }
}

impl fmt::Display for Dual {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gradient.is_empty() {
            write!(formatter, "{}", self.value)
        } else {
            write!(formatter, "{} (gradient {:?})", self.value, self.gradient)
        }
    }
}

impl Add<&Dual> for &Dual {
    type Output = Dual;

    fn add(self, rhs: &Dual) -> Dual {
        self.combine(rhs, self.value + rhs.value, 1.0, 1.0)
    }
}

impl Sub<&Dual> for &Dual {
    type Output = Dual;

    fn sub(self, rhs: &Dual) -> Dual {
        self.combine(rhs, self.value - rhs.value, 1.0, -1.0)
    }
}

impl Mul<&Dual> for &Dual {
    type Output = Dual;

    fn mul(self, rhs: &Dual) -> Dual {
        self.combine(rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

impl Div<&Dual> for &Dual {
    type Output = Dual;

    fn div(self, rhs: &Dual) -> Dual {
        let quotient = self.value / rhs.value;
        self.combine(rhs, quotient, 1.0 / rhs.value, -quotient / rhs.value)
    }
}

macro_rules! forward_binary_op {
    ($op:ident, $method:ident) => {
        impl $op<Dual> for Dual {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                $op::$method(&self, &rhs)
            }
        }

        impl $op<&Dual> for Dual {
            type Output = Dual;

            fn $method(self, rhs: &Dual) -> Dual {
                $op::$method(&self, rhs)
            }
        }

        impl $op<Dual> for &Dual {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                $op::$method(self, &rhs)
            }
        }

        impl $op<f64> for Dual {
            type Output = Dual;

            fn $method(self, rhs: f64) -> Dual {
                $op::$method(&self, &Dual::constant(rhs))
            }
        }

        impl $op<f64> for &Dual {
            type Output = Dual;

            fn $method(self, rhs: f64) -> Dual {
                $op::$method(self, &Dual::constant(rhs))
            }
        }

        impl $op<Dual> for f64 {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                $op::$method(&Dual::constant(self), &rhs)
            }
        }

        impl $op<&Dual> for f64 {
            type Output = Dual;

            fn $method(self, rhs: &Dual) -> Dual {
                $op::$method(&Dual::constant(self), rhs)
            }
        }
    };
}

forward_binary_op!(Add, add);
forward_binary_op!(Sub, sub);
forward_binary_op!(Mul, mul);
forward_binary_op!(Div, div);

impl Neg for &Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        self.chain(-self.value, -1.0)
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        -&self
    }
}

impl Sum for Dual {
    fn sum<I: Iterator<Item = Dual>>(iter: I) -> Self {
        iter.fold(Dual::constant(0.0), |total, term| &total + &term)
    }
}

impl<'a> Sum<&'a Dual> for Dual {
    fn sum<I: Iterator<Item = &'a Dual>>(iter: I) -> Self {
        iter.fold(Dual::constant(0.0), |total, term| &total + term)
    }
}
