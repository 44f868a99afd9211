use thiserror::Error;

/// The base trait for [`Objective`](super::objective::Objective).
pub trait Problem {
    /// Number of variables of the problem.
    fn dim(&self) -> usize;

    /// Name of the problem used for reporting.
    fn name(&self) -> &str;
}

/// Error encountered while applying variables to the objective.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    /// The number of variables does not match the dimensionality
    /// ([`Problem::dim`]) of the problem.
    #[error("invalid dimensionality (expected {expected}, got {actual})")]
    InvalidDimensionality {
        /// Dimension of the problem.
        expected: usize,
        /// Length of the point that was applied.
        actual: usize,
    },
}

impl ProblemError {
    pub(crate) fn check<P: Problem + ?Sized>(p: &P, actual: usize) -> Result<(), Self> {
        let expected = p.dim();
        if expected == actual {
            Ok(())
        } else {
            Err(Self::InvalidDimensionality { expected, actual })
        }
    }
}
