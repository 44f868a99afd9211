//! Core abstractions and types for curvebench.
//!
//! *Users* are mainly interested in implementing the [`Objective`] trait.
//!
//! Algorithms *developers* are interested in implementing the [`Optimizer`]
//! trait and using the [derivatives](crate::derivatives) module.

mod base;
pub(crate) mod hyperparams;
mod objective;
mod optimizer;
mod variable;

pub use base::*;
pub use hyperparams::*;
pub use objective::*;
pub use optimizer::*;
pub use variable::*;
