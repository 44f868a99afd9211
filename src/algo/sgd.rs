//! Stochastic gradient descent.
//!
//! [Stochastic gradient
//! descent](https://en.wikipedia.org/wiki/Stochastic_gradient_descent) moves
//! the point against the gradient scaled by the learning rate. The method
//! optionally keeps a momentum buffer (heavy ball or Nesterov variant) and
//! applies L2 weight decay.
//!
//! # References
//!
//! \[1\] [On the importance of initialization and momentum in deep
//! learning](https://proceedings.mlr.press/v28/sutskever13.html)

use std::fmt;

use getset::{CopyGetters, Setters};
use nalgebra::DVector;

use crate::core::{
    hyperparams::{non_negative, positive},
    Closure, ConfigError, Hyperparams, Optimizer, OptimizerError, Variable,
};
use crate::derivatives::Order;

/// Options for [`Sgd`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct SgdOptions {
    /// Learning rate. Default: `0.001`.
    lr: f64,
    /// Momentum factor. Zero disables the momentum buffer. Default: `0`.
    momentum: f64,
    /// Dampening of the gradient added to the momentum buffer. Default: `0`.
    dampening: f64,
    /// L2 penalty coefficient. Default: `0`.
    weight_decay: f64,
    /// Use Nesterov momentum. Requires non-zero momentum and zero dampening.
    /// Default: `false`.
    nesterov: bool,
}

impl Default for SgdOptions {
    fn default() -> Self {
        Self {
            lr: 0.001,
            momentum: 0.0,
            dampening: 0.0,
            weight_decay: 0.0,
            nesterov: false,
        }
    }
}

impl SgdOptions {
    /// Builds the options from named hyperparameters.
    ///
    /// Recognized names are `lr`, `momentum`, `dampening`, `weight_decay` and
    /// `nesterov`. Missing hyperparameters take the default value.
    pub fn from_hyperparams(hyperparams: &Hyperparams) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        for (name, value) in hyperparams.iter() {
            match name {
                "lr" => options.lr = positive(name, value)?,
                "momentum" => options.momentum = non_negative(name, value)?,
                "dampening" => options.dampening = non_negative(name, value)?,
                "weight_decay" => options.weight_decay = non_negative(name, value)?,
                "nesterov" => options.nesterov = value != 0.0,
                _ => {
                    return Err(ConfigError::UnknownHyperparameter {
                        optimizer: Sgd::NAME,
                        name: name.to_string(),
                    })
                }
            }
        }

        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("lr", self.lr)?;
        non_negative("momentum", self.momentum)?;
        non_negative("dampening", self.dampening)?;
        non_negative("weight_decay", self.weight_decay)?;

        if self.nesterov && (self.momentum == 0.0 || self.dampening != 0.0) {
            return Err(ConfigError::Conflict(
                "Nesterov momentum requires a momentum and zero dampening",
            ));
        }

        Ok(())
    }
}

/// Stochastic gradient descent optimizer.
///
/// See [module](self) documentation for more details.
pub struct Sgd {
    options: SgdOptions,
    variable: Variable,
    momentum_buffer: Option<DVector<f64>>,
}

impl Sgd {
    /// Name of the optimizer.
    pub const NAME: &'static str = "Sgd";

    /// Initializes SGD optimizer with default options.
    pub fn new(variable: Variable) -> Self {
        Self {
            options: SgdOptions::default(),
            variable,
            momentum_buffer: None,
        }
    }

    /// Initializes SGD optimizer with given options.
    pub fn with_options(variable: Variable, options: SgdOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            options,
            variable,
            momentum_buffer: None,
        })
    }

    /// Initializes SGD optimizer with options built from named
    /// hyperparameters. See [`SgdOptions::from_hyperparams`].
    pub fn from_hyperparams(
        variable: Variable,
        hyperparams: &Hyperparams,
    ) -> Result<Self, ConfigError> {
        Self::with_options(variable, SgdOptions::from_hyperparams(hyperparams)?)
    }

    /// [`OptimizerFactory`](crate::core::OptimizerFactory) of boxed SGD
    /// optimizers.
    pub fn boxed(
        variable: Variable,
        hyperparams: &Hyperparams,
    ) -> Result<Box<dyn Optimizer>, ConfigError> {
        Ok(Box::new(Self::from_hyperparams(variable, hyperparams)?))
    }

    /// Gets the options.
    pub fn options(&self) -> &SgdOptions {
        &self.options
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        self.momentum_buffer = None;
    }

    /// Unpacks the variable the optimizer is bound to.
    pub fn into_variable(self) -> Variable {
        self.variable
    }
}

impl fmt::Display for Sgd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SgdOptions {
            lr,
            momentum,
            dampening,
            weight_decay,
            nesterov,
        } = self.options;

        write!(
            f,
            "{} (lr: {}, momentum: {}, dampening: {}, weight_decay: {}, nesterov: {})",
            Self::NAME,
            lr,
            momentum,
            dampening,
            weight_decay,
            nesterov
        )
    }
}

impl Optimizer for Sgd {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> Order {
        Order::First
    }

    fn variable(&self) -> &Variable {
        &self.variable
    }

    fn zero_grad(&mut self) {
        self.variable.zero_grad();
    }

    fn step(&mut self, closure: &mut Closure<'_>) -> Result<f64, OptimizerError> {
        let SgdOptions {
            lr,
            momentum,
            dampening,
            weight_decay,
            nesterov,
        } = self.options;

        let fx = closure(&mut self.variable)?;

        let mut grad = self
            .variable
            .grad()
            .cloned()
            .ok_or(OptimizerError::MissingGradient)?;

        if weight_decay != 0.0 {
            grad.axpy(weight_decay, self.variable.value(), 1.0);
        }

        if momentum != 0.0 {
            let buffer = match self.momentum_buffer.take() {
                Some(mut buffer) => {
                    // buffer = momentum * buffer + (1 - dampening) * grad
                    buffer.axpy(1.0 - dampening, &grad, momentum);
                    buffer
                }
                None => grad.clone(),
            };

            if nesterov {
                grad.axpy(momentum, &buffer, 1.0);
            } else {
                grad.copy_from(&buffer);
            }

            self.momentum_buffer = Some(buffer);
        }

        self.variable.value_mut().axpy(-lr, &grad, 1.0);

        Ok(fx)
    }
}
