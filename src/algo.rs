//! The collection of implemented optimizers.

pub mod newton;
pub mod sgd;

pub use newton::Newton;
pub use sgd::Sgd;
