//! Benchmark objectives and utilities useful for testing optimizers.
//!
//! [`Basic`], [`Rosenbrock`] and [`Quadratic`] form the standard benchmark
//! set. All of them are two-dimensional and have a single, analytically known
//! minimum.
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)

use nalgebra::{dvector, DVector};
use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};

use crate::algo::{Newton, Sgd};
use crate::core::{Hyperparams, Objective, Problem};
use crate::derivatives::Real;
use crate::harness::{all_close, BenchmarkCase, OptimizerConfig, RELATIVE_TOLERANCE};

/// Learning rate of the standard optimizer configurations.
pub const STANDARD_LR: f64 = 0.0015;

/// Number of iterations of the standard optimizer configurations.
pub const STANDARD_ITERATIONS: usize = 15000;

/// Extension of the [`Objective`] trait that provides additional information
/// that is useful for testing optimizers.
pub trait TestObjective: Objective {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<DVector<f64>>;

    /// A set of global optima.
    fn optima(&self) -> Vec<DVector<f64>>;

    /// Test if given point is close to a global optimum, given the absolute
    /// tolerance `eps`.
    fn is_optimum(&self, x: &DVector<f64>, eps: f64) -> bool {
        self.optima()
            .iter()
            .any(|optimum| all_close(x, optimum, eps, RELATIVE_TOLERANCE))
    }
}

/// Simple paraboloid `x² + y²`.
///
/// A trivial problem that can be used in early development and sanity
/// checking.
#[derive(Debug, Clone, Copy, Default)]
pub struct Basic;

impl Problem for Basic {
    fn dim(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "basic"
    }
}

impl Objective for Basic {
    fn eval<T: Real>(&self, x: &[T]) -> T {
        x[0] * x[0] + x[1] * x[1]
    }
}

impl TestObjective for Basic {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![dvector![-1.0, 0.5]]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![dvector![0.0, 0.0]]
    }
}

/// [Rosenbrock function](https://en.wikipedia.org/wiki/Rosenbrock_function)
/// `(a - x)² + b (y - x²)²` \[1\] (also known as Rosenbrock's valley or
/// banana function).
///
/// The global minimum `(a, a²)` is inside a long, narrow, parabolic shaped
/// flat valley. The higher `b` is, the narrower the valley.
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    a: f64,
    b: f64,
}

impl Rosenbrock {
    /// Initializes the function with given parameters.
    pub fn new(a: f64, b: f64) -> Self {
        assert!(b > 0.0, "b must be greater than zero");
        Self { a, b }
    }
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Problem for Rosenbrock {
    fn dim(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "rosenbrock"
    }
}

impl Objective for Rosenbrock {
    fn eval<T: Real>(&self, x: &[T]) -> T {
        let a = T::constant(self.a);
        let b = T::constant(self.b);
        (a - x[0]).powi(2) + b * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl TestObjective for Rosenbrock {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![dvector![1.5, 1.5]]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![dvector![self.a, self.a * self.a]]
    }
}

/// Axis-aligned quadratic `x²/a + y²/b`.
#[derive(Debug, Clone, Copy)]
pub struct Quadratic {
    a: f64,
    b: f64,
}

impl Quadratic {
    /// Initializes the function with given scaling of the axes.
    ///
    /// Both `a` and `b` **must** be positive.
    pub fn new(a: f64, b: f64) -> Self {
        assert!(a > 0.0, "a must be greater than zero");
        assert!(b > 0.0, "b must be greater than zero");
        Self { a, b }
    }
}

impl Default for Quadratic {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Problem for Quadratic {
    fn dim(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "quadratic"
    }
}

impl Objective for Quadratic {
    fn eval<T: Real>(&self, x: &[T]) -> T {
        x[0].powi(2) / T::constant(self.a) + x[1].powi(2) / T::constant(self.b)
    }
}

impl TestObjective for Quadratic {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![dvector![0.5, 0.5]]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![dvector![0.0, 0.0]]
    }
}

/// One of the standard benchmark objectives.
///
/// Allows to keep the cases of the whole benchmark set in a single
/// collection.
#[derive(Debug, Clone, Copy)]
pub enum StandardFunction {
    /// See [`Basic`].
    Basic(Basic),
    /// See [`Rosenbrock`].
    Rosenbrock(Rosenbrock),
    /// See [`Quadratic`].
    Quadratic(Quadratic),
}

impl Problem for StandardFunction {
    fn dim(&self) -> usize {
        match self {
            Self::Basic(f) => f.dim(),
            Self::Rosenbrock(f) => f.dim(),
            Self::Quadratic(f) => f.dim(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Basic(f) => f.name(),
            Self::Rosenbrock(f) => f.name(),
            Self::Quadratic(f) => f.name(),
        }
    }
}

impl Objective for StandardFunction {
    fn eval<T: Real>(&self, x: &[T]) -> T {
        match self {
            Self::Basic(f) => f.eval(x),
            Self::Rosenbrock(f) => f.eval(x),
            Self::Quadratic(f) => f.eval(x),
        }
    }
}

impl TestObjective for StandardFunction {
    fn initials(&self) -> Vec<DVector<f64>> {
        match self {
            Self::Basic(f) => f.initials(),
            Self::Rosenbrock(f) => f.initials(),
            Self::Quadratic(f) => f.initials(),
        }
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        match self {
            Self::Basic(f) => f.optima(),
            Self::Rosenbrock(f) => f.optima(),
            Self::Quadratic(f) => f.optima(),
        }
    }
}

/// The standard benchmark set: every standard function paired with its
/// standard initial point and minimum.
pub fn standard_cases() -> Vec<BenchmarkCase<StandardFunction>> {
    [
        StandardFunction::Basic(Basic),
        StandardFunction::Rosenbrock(Rosenbrock::default()),
        StandardFunction::Quadratic(Quadratic::default()),
    ]
    .into_iter()
    .flat_map(|f| {
        let optimum = f.optima().remove(0);
        f.initials()
            .into_iter()
            .map(move |x0| BenchmarkCase::new(f, x0, optimum.clone()))
    })
    .collect()
}

/// The standard optimizer configurations: [`Sgd`] and [`Newton`] with
/// learning rate [`STANDARD_LR`] running for [`STANDARD_ITERATIONS`].
pub fn standard_configs() -> Vec<OptimizerConfig> {
    let hyperparams = Hyperparams::new().with("lr", STANDARD_LR);

    vec![
        OptimizerConfig::new(Sgd::boxed, hyperparams.clone(), STANDARD_ITERATIONS),
        OptimizerConfig::new(Newton::boxed, hyperparams, STANDARD_ITERATIONS),
    ]
}

/// Samples `count` points normally distributed around the first standard
/// initial point of the objective with standard deviation `spread`.
///
/// The spread must be finite and non-negative, otherwise
/// [`NormalError::BadVariance`] is returned.
pub fn sample_initials<F, R>(
    f: &F,
    rng: &mut R,
    count: usize,
    spread: f64,
) -> Result<Vec<DVector<f64>>, NormalError>
where
    F: TestObjective,
    R: Rng + ?Sized,
{
    if spread.is_nan() || spread < 0.0 {
        return Err(NormalError::BadVariance);
    }

    let center = f.initials().remove(0);
    let noise = Normal::new(0.0, spread)?;

    Ok((0..count)
        .map(|_| center.map(|ci| ci + noise.sample(rng)))
        .collect())
}
