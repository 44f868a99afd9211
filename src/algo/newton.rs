//! Damped Newton method.
//!
//! [Newton's method in
//! optimization](https://en.wikipedia.org/wiki/Newton%27s_method_in_optimization)
//! scales the gradient by the inverse of the Hessian matrix, which makes the
//! step invariant to the conditioning of the problem. A small multiple of the
//! identity is added to the Hessian (damping) and, if the result is still not
//! positive definite, the gradient direction is taken instead.
//!
//! The step length can be controlled by a backtracking line search
//! satisfying the Armijo condition, in which case the objective is evaluated
//! multiple times within a single step.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

use std::fmt;

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::core::{
    hyperparams::{count, non_negative, positive},
    Closure, ConfigError, Hyperparams, Optimizer, OptimizerError, Variable,
};
use crate::derivatives::Order;

/// Sufficient decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Options for [`Newton`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NewtonOptions {
    /// Fraction of the Newton step taken (initial step length of the line
    /// search). Default: `1`.
    lr: f64,
    /// Multiple of the identity added to the Hessian matrix. Default: `1e-8`.
    damping: f64,
    /// Maximum number of step halvings in the line search. Zero disables the
    /// line search. When the budget runs out, the last halved step is taken
    /// without being evaluated, even if the objective increases, and the
    /// derivatives held by the variable belong to the previous trial point.
    /// Default: `0`.
    max_backtracks: usize,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            lr: 1.0,
            damping: 1e-8,
            max_backtracks: 0,
        }
    }
}

impl NewtonOptions {
    /// Builds the options from named hyperparameters.
    ///
    /// Recognized names are `lr`, `damping` and `max_backtracks`. Missing
    /// hyperparameters take the default value.
    pub fn from_hyperparams(hyperparams: &Hyperparams) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        for (name, value) in hyperparams.iter() {
            match name {
                "lr" => options.lr = positive(name, value)?,
                "damping" => options.damping = non_negative(name, value)?,
                "max_backtracks" => options.max_backtracks = count(name, value)?,
                _ => {
                    return Err(ConfigError::UnknownHyperparameter {
                        optimizer: Newton::NAME,
                        name: name.to_string(),
                    })
                }
            }
        }

        Ok(options)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("lr", self.lr)?;
        non_negative("damping", self.damping)?;
        Ok(())
    }
}

/// Damped Newton optimizer.
///
/// See [module](self) documentation for more details.
pub struct Newton {
    options: NewtonOptions,
    variable: Variable,
    origin: DVector<f64>,
}

impl Newton {
    /// Name of the optimizer.
    pub const NAME: &'static str = "Newton";

    /// Initializes Newton optimizer with default options.
    pub fn new(variable: Variable) -> Self {
        let origin = variable.value().clone();

        Self {
            options: NewtonOptions::default(),
            variable,
            origin,
        }
    }

    /// Initializes Newton optimizer with given options.
    pub fn with_options(variable: Variable, options: NewtonOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            options,
            ..Self::new(variable)
        })
    }

    /// Initializes Newton optimizer with options built from named
    /// hyperparameters. See [`NewtonOptions::from_hyperparams`].
    pub fn from_hyperparams(
        variable: Variable,
        hyperparams: &Hyperparams,
    ) -> Result<Self, ConfigError> {
        Self::with_options(variable, NewtonOptions::from_hyperparams(hyperparams)?)
    }

    /// [`OptimizerFactory`](crate::core::OptimizerFactory) of boxed Newton
    /// optimizers.
    pub fn boxed(
        variable: Variable,
        hyperparams: &Hyperparams,
    ) -> Result<Box<dyn Optimizer>, ConfigError> {
        Ok(Box::new(Self::from_hyperparams(variable, hyperparams)?))
    }

    /// Gets the options.
    pub fn options(&self) -> &NewtonOptions {
        &self.options
    }

    /// Unpacks the variable the optimizer is bound to.
    pub fn into_variable(self) -> Variable {
        self.variable
    }

    fn move_to(&mut self, direction: &DVector<f64>, t: f64) {
        let x = self.variable.value_mut();
        x.copy_from(&self.origin);
        x.axpy(-t, direction, 1.0);
    }
}

impl fmt::Display for Newton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let NewtonOptions {
            lr,
            damping,
            max_backtracks,
        } = self.options;

        write!(
            f,
            "{} (lr: {}, damping: {}, max_backtracks: {})",
            Self::NAME,
            lr,
            damping,
            max_backtracks
        )
    }
}

impl Optimizer for Newton {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> Order {
        Order::Second
    }

    fn variable(&self) -> &Variable {
        &self.variable
    }

    fn zero_grad(&mut self) {
        self.variable.zero_grad();
    }

    fn step(&mut self, closure: &mut Closure<'_>) -> Result<f64, OptimizerError> {
        let NewtonOptions {
            lr,
            damping,
            max_backtracks,
        } = self.options;

        let fx = closure(&mut self.variable)?;

        let grad = self
            .variable
            .grad()
            .cloned()
            .ok_or(OptimizerError::MissingGradient)?;
        let hess = self
            .variable
            .curvature()
            .cloned()
            .ok_or(OptimizerError::MissingCurvature)?;

        let n = grad.nrows();
        let damped = hess + DMatrix::identity(n, n) * damping;

        // Solve (H + λI) d = g.
        let direction = match damped.cholesky() {
            Some(chol) => chol.solve(&grad),
            None => {
                debug!("damped Hessian is not positive definite, taking gradient direction");
                grad.clone()
            }
        };

        self.origin.copy_from(self.variable.value());

        let mut t = lr;
        self.move_to(&direction, t);

        let slope = grad.dot(&direction);
        if max_backtracks > 0 && slope > 0.0 {
            for _ in 0..max_backtracks {
                let trial = closure(&mut self.variable)?;

                if trial <= fx - ARMIJO * t * slope {
                    break;
                }

                t *= 0.5;
                debug!("sufficient decrease not met (f = {}), shrink step to {}", trial, t);
                self.move_to(&direction, t);
            }
        }

        Ok(fx)
    }
}
