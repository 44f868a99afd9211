use super::base::Problem;
use crate::derivatives::Real;

/// The trait for defining objective functions.
///
/// ## Defining an objective
///
/// An objective is any type that implements [`Objective`] and [`Problem`]
/// traits. The function is written once, generically over the [`Real`]
/// scalar, so that the same code is evaluated on plain `f64` values as well
/// as on dual numbers when derivatives are needed.
///
/// ```rust
/// use curvebench::derivatives::Real;
/// use curvebench::{Objective, Problem};
///
/// // An objective is represented by a type.
/// struct Rosenbrock {
///     a: f64,
///     b: f64,
/// }
///
/// impl Problem for Rosenbrock {
///     fn dim(&self) -> usize {
///         2
///     }
///
///     fn name(&self) -> &str {
///         "rosenbrock"
///     }
/// }
///
/// impl Objective for Rosenbrock {
///     fn eval<T: Real>(&self, x: &[T]) -> T {
///         let a = T::constant(self.a);
///         let b = T::constant(self.b);
///         (a - x[0]).powi(2) + b * (x[1] - x[0].powi(2)).powi(2)
///     }
/// }
/// ```
///
/// Objectives must be pure: the same point always evaluates to the same
/// value. The length of `x` is guaranteed to be [`Problem::dim`] when called
/// through [`derivatives`](crate::derivatives).
pub trait Objective: Problem {
    /// Calculate the objective value given values of the variables.
    fn eval<T: Real>(&self, x: &[T]) -> T;
}
