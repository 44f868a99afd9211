//! The decision variable of the optimization process.

use nalgebra::{DMatrix, DVector};

/// Point being optimized together with the derivative information
/// accumulated by backward passes.
///
/// Gradients and curvature *accumulate*: every backward pass adds to what is
/// already stored until [`zero_grad`](Variable::zero_grad) clears it. The
/// value is changed only by the optimizer that owns the variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    value: DVector<f64>,
    grad: Option<DVector<f64>>,
    curvature: Option<DMatrix<f64>>,
}

impl Variable {
    /// Creates a variable with given initial value and no gradient.
    pub fn new(value: Vec<f64>) -> Self {
        Self::from_vector(DVector::from_vec(value))
    }

    /// Creates a variable from an existing vector.
    pub fn from_vector(value: DVector<f64>) -> Self {
        Self {
            value,
            grad: None,
            curvature: None,
        }
    }

    /// Gets the number of components.
    pub fn dim(&self) -> usize {
        self.value.nrows()
    }

    /// Gets the current value.
    pub fn value(&self) -> &DVector<f64> {
        &self.value
    }

    /// Gets mutable access to the current value.
    ///
    /// Intended for [`Optimizer`](super::optimizer::Optimizer)
    /// implementations, which are the only ones allowed to move the point.
    pub fn value_mut(&mut self) -> &mut DVector<f64> {
        &mut self.value
    }

    /// Gets the accumulated gradient, if any backward pass happened since the
    /// last reset.
    pub fn grad(&self) -> Option<&DVector<f64>> {
        self.grad.as_ref()
    }

    /// Gets the accumulated Hessian matrix, if any second-order backward pass
    /// happened since the last reset.
    pub fn curvature(&self) -> Option<&DMatrix<f64>> {
        self.curvature.as_ref()
    }

    /// Adds `grad` to the accumulated gradient.
    pub fn accumulate_grad(&mut self, grad: &DVector<f64>) {
        match &mut self.grad {
            Some(acc) => *acc += grad,
            None => self.grad = Some(grad.clone()),
        }
    }

    /// Adds `hessian` to the accumulated curvature.
    pub fn accumulate_curvature(&mut self, hessian: &DMatrix<f64>) {
        match &mut self.curvature {
            Some(acc) => *acc += hessian,
            None => self.curvature = Some(hessian.clone()),
        }
    }

    /// Clears all accumulated derivative information.
    pub fn zero_grad(&mut self) {
        self.grad = None;
        self.curvature = None;
    }

    /// Unpacks the current value.
    pub fn into_value(self) -> DVector<f64> {
        self.value
    }
}
