//! Named hyperparameters passed to optimizer factories.

use std::collections::BTreeMap;
use std::iter::FromIterator;

use thiserror::Error;

/// Error when turning [`Hyperparams`] into optimizer options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The optimizer does not know the hyperparameter.
    #[error("unknown hyperparameter `{name}` for {optimizer}")]
    UnknownHyperparameter {
        /// Name of the optimizer.
        optimizer: &'static str,
        /// Name of the hyperparameter.
        name: String,
    },
    /// The value is out of the allowed range.
    #[error("invalid value {value} of hyperparameter `{name}`")]
    InvalidValue {
        /// Name of the hyperparameter.
        name: String,
        /// Rejected value.
        value: f64,
    },
    /// Individually valid hyperparameters that cannot be used together.
    #[error("{0}")]
    Conflict(&'static str),
}

/// Mapping of hyperparameter names to numeric values.
///
/// The mapping is passed verbatim to an
/// [`OptimizerFactory`](super::optimizer::OptimizerFactory), which is
/// responsible for validating it. Boolean flags are encoded as zero (false)
/// and non-zero (true).
///
/// ```rust
/// use curvebench::Hyperparams;
///
/// let hp = Hyperparams::new().with("lr", 0.0015).with("momentum", 0.9);
/// assert_eq!(hp.get("lr"), Some(0.0015));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hyperparams {
    values: BTreeMap<String, f64>,
}

impl Hyperparams {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hyperparameter, replacing the previous value of the same name.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a hyperparameter, returning the previous value if any.
    pub fn insert(&mut self, name: &str, value: f64) -> Option<f64> {
        self.values.insert(name.to_string(), value)
    }

    /// Gets the value of a hyperparameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Iterates over hyperparameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Gets the number of hyperparameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Determines whether there are no hyperparameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Hyperparams {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self { values }
    }
}

/// Checks that the value is finite and strictly positive.
pub(crate) fn positive(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value))
    }
}

/// Checks that the value is finite and not negative.
pub(crate) fn non_negative(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value))
    }
}

/// Checks that the value is a non-negative whole number.
pub(crate) fn count(name: &str, value: f64) -> Result<usize, ConfigError> {
    let value = non_negative(name, value)?;
    if value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(invalid(name, value))
    }
}

fn invalid(name: &str, value: f64) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value,
    }
}
