//! Tools for derivative-based methods.
//!
//! Derivatives are computed exactly with forward-mode automatic
//! differentiation. An [`Objective`] is evaluated on [`Dual`] numbers to get
//! the gradient and on [`HyperDual`] numbers to get the Hessian matrix. Since
//! every evaluation recomputes the derivatives from scratch, there is no
//! computation graph to retain and the objective can be differentiated any
//! number of times within one optimization step. What is computed is decided
//! explicitly by the [`Order`] passed to [`backward`].
//!
//! # References
//!
//! \[1\] [Automatic
//! differentiation](https://en.wikipedia.org/wiki/Automatic_differentiation)
//!
//! \[2\] [The Development of Hyper-Dual Numbers for Exact Second-Derivative
//! Calculations](https://doi.org/10.2514/6.2011-886)

use std::ops::{Add, Div, Mul, Neg, Sub};

use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use crate::core::{Objective, ProblemError, Variable};

/// Derivative information requested from an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Value and gradient.
    First,
    /// Value, gradient and Hessian matrix.
    Second,
}

/// Scalar type the objectives are evaluated on.
///
/// Implemented for `f64` (plain evaluation), [`Dual`] and [`HyperDual`].
pub trait Real:
    Copy
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Lifts a constant into the scalar type.
    fn constant(value: f64) -> Self;

    /// Gets the real part of the scalar.
    fn re(&self) -> f64;

    /// Raises to an integer power.
    fn powi(self, n: i32) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;

    /// Exponential function.
    fn exp(self) -> Self;

    /// Natural logarithm.
    fn ln(self) -> Self;

    /// Sine.
    fn sin(self) -> Self;

    /// Cosine.
    fn cos(self) -> Self;
}

impl Real for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn re(&self) -> f64 {
        *self
    }

    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }
}

// First and second derivative of x^n in a.
fn powi_derivatives(a: f64, n: i32) -> (f64, f64) {
    let nf = f64::from(n);
    let d1 = if n == 0 { 0.0 } else { nf * a.powi(n - 1) };
    let d2 = if n == 0 || n == 1 {
        0.0
    } else {
        nf * (nf - 1.0) * a.powi(n - 2)
    };
    (d1, d2)
}

/// Dual number `re + eps ε` with `ε² = 0`.
///
/// Evaluating a function on `x + ε` yields `f(x) + f'(x) ε`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    /// Real part.
    pub re: f64,
    /// Infinitesimal part.
    pub eps: f64,
}

impl Dual {
    /// Creates a dual number.
    pub fn new(re: f64, eps: f64) -> Self {
        Self { re, eps }
    }

    /// Creates a dual number seeded for differentiation with respect to it.
    pub fn variable(re: f64) -> Self {
        Self::new(re, 1.0)
    }

    fn chain(self, f0: f64, f1: f64) -> Self {
        Self::new(f0, f1 * self.eps)
    }
}

impl Add for Dual {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.re * rhs.re, self.re * rhs.eps + self.eps * rhs.re)
    }
}

impl Div for Dual {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let re = self.re / rhs.re;
        let eps = (self.eps * rhs.re - self.re * rhs.eps) / (rhs.re * rhs.re);
        Self::new(re, eps)
    }
}

impl Neg for Dual {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.re, -self.eps)
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Real for Dual {
    fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    fn re(&self) -> f64 {
        self.re
    }

    fn powi(self, n: i32) -> Self {
        let (d1, _) = powi_derivatives(self.re, n);
        self.chain(self.re.powi(n), d1)
    }

    fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    fn ln(self) -> Self {
        self.chain(self.re.ln(), 1.0 / self.re)
    }

    fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }
}

/// Hyper-dual number `re + e1 ε1 + e2 ε2 + e12 ε1ε2` with `ε1² = ε2² = 0`.
///
/// Evaluating a function on `x + ε1 u + ε2 v` yields the directional
/// derivatives `∇f·u` and `∇f·v` in `e1` and `e2` and the exact second
/// derivative `uᵀ ∇²f v` in `e12`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperDual {
    /// Real part.
    pub re: f64,
    /// First infinitesimal part.
    pub e1: f64,
    /// Second infinitesimal part.
    pub e2: f64,
    /// Mixed infinitesimal part.
    pub e12: f64,
}

impl HyperDual {
    /// Creates a hyper-dual number.
    pub fn new(re: f64, e1: f64, e2: f64, e12: f64) -> Self {
        Self { re, e1, e2, e12 }
    }

    fn chain(self, f0: f64, f1: f64, f2: f64) -> Self {
        Self::new(
            f0,
            f1 * self.e1,
            f1 * self.e2,
            f1 * self.e12 + f2 * self.e1 * self.e2,
        )
    }

    fn recip(self) -> Self {
        let inv = 1.0 / self.re;
        self.chain(inv, -inv * inv, 2.0 * inv * inv * inv)
    }
}

impl Add for HyperDual {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.re + rhs.re,
            self.e1 + rhs.e1,
            self.e2 + rhs.e2,
            self.e12 + rhs.e12,
        )
    }
}

impl Sub for HyperDual {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.re - rhs.re,
            self.e1 - rhs.e1,
            self.e2 - rhs.e2,
            self.e12 - rhs.e12,
        )
    }
}

impl Mul for HyperDual {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re,
            self.re * rhs.e1 + self.e1 * rhs.re,
            self.re * rhs.e2 + self.e2 * rhs.re,
            self.re * rhs.e12 + self.e1 * rhs.e2 + self.e2 * rhs.e1 + self.e12 * rhs.re,
        )
    }
}

impl Div for HyperDual {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.recip()
    }
}

impl Neg for HyperDual {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.re, -self.e1, -self.e2, -self.e12)
    }
}

impl Zero for HyperDual {
    fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.e1 == 0.0 && self.e2 == 0.0 && self.e12 == 0.0
    }
}

impl One for HyperDual {
    fn one() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl Real for HyperDual {
    fn constant(value: f64) -> Self {
        Self::new(value, 0.0, 0.0, 0.0)
    }

    fn re(&self) -> f64 {
        self.re
    }

    fn powi(self, n: i32) -> Self {
        let (d1, d2) = powi_derivatives(self.re, n);
        self.chain(self.re.powi(n), d1, d2)
    }

    fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, 0.5 / s, -0.25 / (s * self.re))
    }

    fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e, e)
    }

    fn ln(self) -> Self {
        let inv = 1.0 / self.re;
        self.chain(self.re.ln(), inv, -inv * inv)
    }

    fn sin(self) -> Self {
        let (s, c) = self.re.sin_cos();
        self.chain(s, c, -s)
    }

    fn cos(self) -> Self {
        let (s, c) = self.re.sin_cos();
        self.chain(c, -s, -c)
    }
}

/// Evaluates the objective in given point.
pub fn value<F: Objective>(f: &F, x: &DVector<f64>) -> Result<f64, ProblemError> {
    ProblemError::check(f, x.nrows())?;
    Ok(f.eval(x.as_slice()))
}

/// Computes the objective value and the gradient in given point.
pub fn gradient<F: Objective>(
    f: &F,
    x: &DVector<f64>,
) -> Result<(f64, DVector<f64>), ProblemError> {
    ProblemError::check(f, x.nrows())?;

    let n = x.nrows();
    let mut point = x.iter().map(|xi| Dual::constant(*xi)).collect::<Vec<_>>();
    let mut grad = DVector::zeros(n);

    // One pass per variable, seeding its infinitesimal part.
    for i in 0..n {
        point[i].eps = 1.0;
        grad[i] = f.eval(&point).eps;
        point[i].eps = 0.0;
    }

    Ok((f.eval(x.as_slice()), grad))
}

/// Computes the objective value, the gradient and the Hessian matrix in given
/// point.
pub fn hessian<F: Objective>(
    f: &F,
    x: &DVector<f64>,
) -> Result<(f64, DVector<f64>, DMatrix<f64>), ProblemError> {
    ProblemError::check(f, x.nrows())?;

    let n = x.nrows();
    let mut point = x
        .iter()
        .map(|xi| HyperDual::constant(*xi))
        .collect::<Vec<_>>();
    let mut grad = DVector::zeros(n);
    let mut hess = DMatrix::zeros(n, n);

    // The Hessian is symmetric, only the upper triangle is evaluated.
    for i in 0..n {
        for j in i..n {
            point[i].e1 = 1.0;
            point[j].e2 = 1.0;

            let fx = f.eval(&point);
            if i == j {
                grad[i] = fx.e1;
            }
            hess[(i, j)] = fx.e12;
            hess[(j, i)] = fx.e12;

            point[i].e1 = 0.0;
            point[j].e2 = 0.0;
        }
    }

    Ok((f.eval(x.as_slice()), grad, hess))
}

/// Evaluates the objective in the current value of the variable and
/// accumulates the derivatives requested by `order` into it.
///
/// Returns the objective value. The derivatives are added to what the
/// variable already holds, call [`Variable::zero_grad`] beforehand to start
/// from scratch.
pub fn backward<F: Objective>(
    f: &F,
    var: &mut Variable,
    order: Order,
) -> Result<f64, ProblemError> {
    match order {
        Order::First => {
            let (fx, grad) = gradient(f, var.value())?;
            var.accumulate_grad(&grad);
            Ok(fx)
        }
        Order::Second => {
            let (fx, grad, hess) = hessian(f, var.value())?;
            var.accumulate_grad(&grad);
            var.accumulate_curvature(&hess);
            Ok(fx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::Problem;
    use crate::testing::Rosenbrock;

    use approx::assert_relative_eq;
    use nalgebra::{dmatrix, dvector};

    struct Mixed;

    impl Problem for Mixed {
        fn dim(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "mixed"
        }
    }

    impl Objective for Mixed {
        fn eval<T: Real>(&self, x: &[T]) -> T {
            x[0].sin() * x[1].exp() + x[0].sqrt() / x[1] - x[0].ln() * x[0].cos()
        }
    }

    #[test]
    fn dual_arithmetic() {
        let x = Dual::variable(2.0);
        let c = Dual::constant(3.0);

        assert_eq!(x + c, Dual::new(5.0, 1.0));
        assert_eq!(x * c, Dual::new(6.0, 3.0));
        assert_eq!(x - c, Dual::new(-1.0, 1.0));
        assert_eq!(-x, Dual::new(-2.0, -1.0));
        assert_relative_eq!((x / c).eps, 1.0 / 3.0);
        assert_relative_eq!((c / x).eps, -0.75);
        assert_eq!(x.powi(3), Dual::new(8.0, 12.0));
        assert_eq!(x.powi(0), Dual::new(1.0, 0.0));
    }

    #[test]
    fn powi_in_zero() {
        let x = HyperDual::new(0.0, 1.0, 1.0, 0.0);
        assert_eq!(x.powi(1), x);
        assert_eq!(x.powi(2), HyperDual::new(0.0, 0.0, 0.0, 2.0));
    }

    #[test]
    fn rosenbrock_derivatives() {
        let f = Rosenbrock::default();
        let x = dvector![1.5, 1.5];

        let (fx, grad) = gradient(&f, &x).unwrap();
        assert_relative_eq!(fx, 0.8125);
        assert_relative_eq!(grad, dvector![5.5, -1.5], epsilon = 1e-12);

        let (fx, grad, hess) = hessian(&f, &x).unwrap();
        assert_relative_eq!(fx, 0.8125);
        assert_relative_eq!(grad, dvector![5.5, -1.5], epsilon = 1e-12);
        assert_relative_eq!(hess, dmatrix![23.0, -6.0; -6.0, 2.0], epsilon = 1e-12);
    }

    #[test]
    fn transcendental_derivatives() {
        let (x, y) = (1.3f64, 0.7f64);

        let dx = x.cos() * y.exp() + 0.5 / (x.sqrt() * y) - 1.0 / x * x.cos() + x.ln() * x.sin();
        let dy = x.sin() * y.exp() - x.sqrt() / (y * y);
        let dxx = -x.sin() * y.exp() - 0.25 / (x.powf(1.5) * y)
            + 1.0 / (x * x) * x.cos()
            + 2.0 / x * x.sin()
            + x.ln() * x.cos();
        let dxy = x.cos() * y.exp() - 0.5 / (x.sqrt() * y * y);
        let dyy = x.sin() * y.exp() + 2.0 * x.sqrt() / (y * y * y);

        let (_, grad, hess) = hessian(&Mixed, &dvector![x, y]).unwrap();
        assert_relative_eq!(grad, dvector![dx, dy], epsilon = 1e-12);
        assert_relative_eq!(hess, dmatrix![dxx, dxy; dxy, dyy], epsilon = 1e-12);

        let (_, grad) = gradient(&Mixed, &dvector![x, y]).unwrap();
        assert_relative_eq!(grad, dvector![dx, dy], epsilon = 1e-12);
    }

    #[test]
    fn backward_accumulates() {
        let f = Rosenbrock::default();
        let mut var = Variable::new(vec![1.5, 1.5]);

        backward(&f, &mut var, Order::First).unwrap();
        assert!(var.curvature().is_none());

        backward(&f, &mut var, Order::Second).unwrap();
        assert_relative_eq!(*var.grad().unwrap(), dvector![11.0, -3.0], epsilon = 1e-12);
        assert_relative_eq!(
            *var.curvature().unwrap(),
            dmatrix![23.0, -6.0; -6.0, 2.0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn invalid_dimensionality() {
        let f = Rosenbrock::default();
        let mut var = Variable::new(vec![1.0, 2.0, 3.0]);

        assert_eq!(
            backward(&f, &mut var, Order::First),
            Err(ProblemError::InvalidDimensionality {
                expected: 2,
                actual: 3
            })
        );
        assert!(var.grad().is_none());
        assert!(value(&f, &dvector![1.0]).is_err());
    }
}
