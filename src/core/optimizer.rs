use std::fmt;

use thiserror::Error;

use super::{
    base::ProblemError,
    hyperparams::{ConfigError, Hyperparams},
    variable::Variable,
};
use crate::derivatives::Order;

/// Evaluation callback passed to [`Optimizer::step`].
///
/// The closure evaluates the objective at the current value of the variable,
/// populates the derivative information requested by [`Optimizer::order`] and
/// returns the objective value. It can be called any number of times within
/// a single step.
pub type Closure<'a> = dyn FnMut(&mut Variable) -> Result<f64, ProblemError> + 'a;

/// Constructor of a boxed optimizer bound to given variable.
pub type OptimizerFactory = fn(Variable, &Hyperparams) -> Result<Box<dyn Optimizer>, ConfigError>;

/// Error while computing the next step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerError {
    /// Error that occurred when evaluating the objective.
    #[error("{0}")]
    Problem(#[from] ProblemError),
    /// The closure did not populate the gradient.
    #[error("gradient is missing after evaluation")]
    MissingGradient,
    /// The closure did not populate the Hessian matrix.
    #[error("curvature is missing after evaluation")]
    MissingCurvature,
}

/// Interface of an optimizer.
///
/// An optimizer is a stateful iterative algorithm bound to exactly one
/// [`Variable`]. Each call to [`step`](Optimizer::step) updates the variable
/// in place. Repeated steps should eventually move the variable into a
/// minimum in successful cases.
///
/// The textual representation ([`Display`](fmt::Display)) must mention the
/// [`name`](Optimizer::name) of the optimizer.
///
/// ## Implementing an optimizer
///
/// Here is an implementation of plain gradient descent with a fixed step.
///
/// ```rust
/// use std::fmt;
///
/// use curvebench::derivatives::Order;
/// use curvebench::{Closure, Optimizer, OptimizerError, Variable};
///
/// struct Descent {
///     variable: Variable,
///     lr: f64,
/// }
///
/// impl fmt::Display for Descent {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "Descent (lr: {})", self.lr)
///     }
/// }
///
/// impl Optimizer for Descent {
///     fn name(&self) -> &'static str {
///         "Descent"
///     }
///
///     fn order(&self) -> Order {
///         Order::First
///     }
///
///     fn variable(&self) -> &Variable {
///         &self.variable
///     }
///
///     fn zero_grad(&mut self) {
///         self.variable.zero_grad();
///     }
///
///     fn step(&mut self, closure: &mut Closure<'_>) -> Result<f64, OptimizerError> {
///         // We must evaluate the objective to get the gradient.
///         let value = closure(&mut self.variable)?;
///         let grad = self
///             .variable
///             .grad()
///             .cloned()
///             .ok_or(OptimizerError::MissingGradient)?;
///
///         *self.variable.value_mut() -= grad * self.lr;
///         Ok(value)
///     }
/// }
/// ```
pub trait Optimizer: fmt::Display {
    /// Name of the optimizer.
    fn name(&self) -> &'static str;

    /// Derivative information the optimizer consumes from the closure.
    fn order(&self) -> Order;

    /// Gets the variable the optimizer is bound to.
    fn variable(&self) -> &Variable;

    /// Clears accumulated gradient state of the variable.
    fn zero_grad(&mut self);

    /// Performs exactly one update of the variable.
    ///
    /// The closure must be called at least once. The return value is the
    /// objective value reported by the first call, that is, the value before
    /// the update.
    fn step(&mut self, closure: &mut Closure<'_>) -> Result<f64, OptimizerError>;
}
