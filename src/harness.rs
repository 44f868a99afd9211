//! Convergence benchmark harness.
//!
//! A benchmark runs a configured optimizer for a fixed number of iterations
//! on an objective with a known minimum and checks that the final point lies
//! within a tolerance of that minimum. The guarantee is empirical: it holds
//! for the validated combinations of objective, initial point,
//! hyperparameters and iteration count.
//!
//! ```rust
//! use curvebench::algo::Sgd;
//! use curvebench::harness::{run_benchmark, BenchmarkCase, OptimizerConfig, DEFAULT_TOLERANCE};
//! use curvebench::nalgebra::dvector;
//! use curvebench::testing::Basic;
//! use curvebench::Hyperparams;
//!
//! let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
//! let config = OptimizerConfig::new(Sgd::boxed, Hyperparams::new().with("lr", 0.01), 2000);
//!
//! let report = run_benchmark(&case, &config, DEFAULT_TOLERANCE).expect("converged");
//! println!("{}: x = {:?}", report.description(), report.x().as_slice());
//! ```
//!
//! Each iteration evaluates the objective for the [`Trajectory`], resets the
//! gradients and lets the optimizer do one step, passing it a closure that
//! recomputes the objective together with the derivatives the optimizer asks
//! for through [`Optimizer::order`](crate::Optimizer::order). The harness
//! never moves the point itself.

use std::fmt;
use std::io::{self, Write};

use getset::{CopyGetters, Getters};
use log::debug;
use nalgebra::DVector;
use thiserror::Error;

use crate::core::{
    ConfigError, Hyperparams, Objective, OptimizerError, OptimizerFactory, ProblemError, Variable,
};
use crate::derivatives::{backward, value};

/// Absolute tolerance of the standard benchmarks.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Relative tolerance used in closeness checks on top of the absolute one.
pub const RELATIVE_TOLERANCE: f64 = 1e-5;

/// Determines whether `a` and `b` are element-wise equal within
/// `atol + rtol * |b|`.
///
/// Vectors of different length are never close. Any non-finite difference
/// (NaN or infinite component) makes the vectors not close.
pub fn all_close(a: &DVector<f64>, b: &DVector<f64>, atol: f64, rtol: f64) -> bool {
    a.nrows() == b.nrows()
        && a
            .iter()
            .zip(b.iter())
            .all(|(ai, bi)| (ai - bi).abs() <= atol + rtol * bi.abs())
}

/// Objective together with the initial point and the location of its known
/// minimum.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct BenchmarkCase<F> {
    /// The objective function.
    objective: F,
    /// The point the optimization starts from.
    initial: DVector<f64>,
    /// The analytic minimizer of the objective.
    expected: DVector<f64>,
}

impl<F> BenchmarkCase<F> {
    /// Creates a benchmark case.
    pub fn new(objective: F, initial: DVector<f64>, expected: DVector<f64>) -> Self {
        Self {
            objective,
            initial,
            expected,
        }
    }
}

impl<F: Objective> fmt::Display for BenchmarkCase<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.objective.name(),
            Point(&self.initial),
            Point(&self.expected)
        )
    }
}

struct Point<'a>(&'a DVector<f64>);

impl fmt::Display for Point<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, xi) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", xi)?;
        }
        write!(f, ")")
    }
}

/// Optimizer constructor with its hyperparameters and the number of
/// iterations to run.
#[derive(Clone, Getters, CopyGetters)]
pub struct OptimizerConfig {
    /// Constructor of the optimizer.
    #[getset(get_copy = "pub")]
    factory: OptimizerFactory,
    /// Hyperparameters passed verbatim to the factory.
    #[getset(get = "pub")]
    hyperparams: Hyperparams,
    /// Number of optimization steps.
    #[getset(get_copy = "pub")]
    iterations: usize,
}

impl OptimizerConfig {
    /// Creates an optimizer configuration.
    pub fn new(factory: OptimizerFactory, hyperparams: Hyperparams, iterations: usize) -> Self {
        Self {
            factory,
            hyperparams,
            iterations,
        }
    }
}

impl fmt::Debug for OptimizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerConfig")
            .field("hyperparams", &self.hyperparams)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

/// Objective values recorded in every iteration.
///
/// Used for diagnostics only, it plays no role in the convergence check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    values: Vec<f64>,
}

impl Trajectory {
    /// Creates an empty trajectory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty trajectory with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Records the value of the next iteration.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Gets the number of recorded iterations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Determines whether no value was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gets the value of the first iteration.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Gets the value of the last iteration.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterates over the recorded values.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Gets the recorded values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Writes the trajectory as CSV with `iteration,value` header, suitable
    /// for plotting.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "iteration,value")?;
        for (iter, value) in self.values.iter().enumerate() {
            writeln!(writer, "{},{}", iter, value)?;
        }
        writer.flush()
    }
}

/// Outcome of a successful benchmark.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Report {
    /// Name of the optimizer.
    #[getset(get_copy = "pub")]
    name: &'static str,
    /// Textual representation of the optimizer.
    #[getset(get = "pub")]
    description: String,
    /// The final point.
    #[getset(get = "pub")]
    x: DVector<f64>,
    /// Objective values of all iterations.
    #[getset(get = "pub")]
    trajectory: Trajectory,
}

/// Error of a benchmark run.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// The number of iterations is zero.
    #[error("number of iterations must be positive")]
    InvalidIterations,
    /// The tolerance is negative or not finite.
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f64),
    /// The initial point or the expected minimum does not fit the objective.
    #[error("{0}")]
    Problem(#[from] ProblemError),
    /// The factory rejected the hyperparameters.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// The optimizer failed in a step.
    #[error("{0}")]
    Optimizer(#[from] OptimizerError),
    /// The final point is not within the tolerance of the expected minimum.
    #[error("final point {actual:?} is not within {tolerance} of the expected minimum {expected:?}")]
    ConvergenceFailure {
        /// The final point.
        actual: Vec<f64>,
        /// The expected minimum.
        expected: Vec<f64>,
        /// The absolute tolerance.
        tolerance: f64,
    },
    /// The textual representation of the optimizer does not mention its
    /// name.
    #[error("description `{description}` does not mention optimizer name `{name}`")]
    SelfDescriptionFailure {
        /// Name of the optimizer.
        name: &'static str,
        /// Textual representation of the optimizer.
        description: String,
    },
}

/// Runs the benchmark and checks that the optimizer converged within
/// `tolerance` of the expected minimum.
///
/// See [`run_benchmark_with`] for the details.
pub fn run_benchmark<F: Objective>(
    case: &BenchmarkCase<F>,
    config: &OptimizerConfig,
    tolerance: f64,
) -> Result<Report, BenchmarkError> {
    run_benchmark_with(case, config, tolerance, |_, _, _| {})
}

/// Runs the benchmark and inspects the optimizer after every step.
///
/// The `inspect` callback receives the iteration number, the variable after
/// the step and the objective value recorded before the step.
///
/// After all iterations, the final point must be element-wise within
/// `tolerance` (plus [`RELATIVE_TOLERANCE`]) of the expected minimum and the
/// textual representation of the optimizer must mention its name. Otherwise
/// [`BenchmarkError::ConvergenceFailure`] or
/// [`BenchmarkError::SelfDescriptionFailure`] is returned. Failures are
/// deterministic, so no retry is attempted.
pub fn run_benchmark_with<F, G>(
    case: &BenchmarkCase<F>,
    config: &OptimizerConfig,
    tolerance: f64,
    mut inspect: G,
) -> Result<Report, BenchmarkError>
where
    F: Objective,
    G: FnMut(usize, &Variable, f64),
{
    if config.iterations == 0 {
        return Err(BenchmarkError::InvalidIterations);
    }

    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(BenchmarkError::InvalidTolerance(tolerance));
    }

    let f = &case.objective;
    ProblemError::check(f, case.initial.nrows())?;
    ProblemError::check(f, case.expected.nrows())?;

    let variable = Variable::from_vector(case.initial.clone());
    let mut optimizer = (config.factory)(variable, &config.hyperparams)?;
    let order = optimizer.order();

    debug!(
        "benchmark {} with {} for {} iterations",
        case, optimizer, config.iterations
    );

    let mut trajectory = Trajectory::with_capacity(config.iterations);

    for iter in 0..config.iterations {
        let fx = value(f, optimizer.variable().value())?;
        trajectory.push(fx);

        optimizer.zero_grad();
        optimizer.step(&mut |var: &mut Variable| {
            var.zero_grad();
            backward(f, var, order)
        })?;

        inspect(iter, optimizer.variable(), fx);
    }

    let x = optimizer.variable().value().clone();

    debug!(
        "benchmark {} finished in {:?} (f = {:?})",
        case,
        x.as_slice(),
        trajectory.last()
    );

    if !all_close(&x, &case.expected, tolerance, RELATIVE_TOLERANCE) {
        return Err(BenchmarkError::ConvergenceFailure {
            actual: x.as_slice().to_vec(),
            expected: case.expected.as_slice().to_vec(),
            tolerance,
        });
    }

    let name = optimizer.name();
    let description = optimizer.to_string();

    if !description.contains(name) {
        return Err(BenchmarkError::SelfDescriptionFailure { name, description });
    }

    Ok(Report {
        name,
        description,
        x,
        trajectory,
    })
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    use crate::algo::{Newton, Sgd};
    use crate::core::{Closure, Optimizer, Problem};
    use crate::derivatives::Order;
    use crate::testing::*;

    use nalgebra::dvector;
    use rand::{rngs::StdRng, SeedableRng};

    fn run_standard(name: &str) {
        let cases = standard_cases()
            .into_iter()
            .filter(|case| case.objective().name() == name)
            .collect::<Vec<_>>();
        assert!(!cases.is_empty());

        for case in &cases {
            for config in standard_configs() {
                let report = run_benchmark(case, &config, DEFAULT_TOLERANCE)
                    .unwrap_or_else(|error| panic!("{} with {:?}: {}", case, config, error));

                assert_eq!(report.trajectory().len(), STANDARD_ITERATIONS);
                assert!(case.objective().is_optimum(report.x(), DEFAULT_TOLERANCE));
            }
        }
    }

    #[test]
    fn basic_converges() {
        run_standard("basic");
    }

    #[test]
    fn rosenbrock_converges() {
        run_standard("rosenbrock");
    }

    #[test]
    fn quadratic_converges() {
        run_standard("quadratic");
    }

    #[test]
    fn starts_in_initial_point() {
        for case in standard_cases() {
            for config in standard_configs() {
                let variable = Variable::from_vector(case.initial().clone());
                let optimizer = (config.factory())(variable, config.hyperparams()).unwrap();
                assert_eq!(optimizer.variable().value(), case.initial());
                assert!(optimizer.variable().grad().is_none());

                let config = OptimizerConfig::new(config.factory(), config.hyperparams().clone(), 1);
                let report = run_benchmark_with(&case, &config, f64::MAX, |_, _, _| {}).unwrap();
                assert_eq!(
                    report.trajectory().first(),
                    Some(value(case.objective(), case.initial()).unwrap())
                );
            }
        }
    }

    #[test]
    fn deterministic() {
        let f = Rosenbrock::default();
        let mut rng = StdRng::seed_from_u64(42);

        for x0 in sample_initials(&f, &mut rng, 3, 0.05).unwrap() {
            let case = BenchmarkCase::new(f, x0, f.optima().remove(0));

            for config in standard_configs() {
                let config = OptimizerConfig::new(config.factory(), config.hyperparams().clone(), 500);
                let first = run_benchmark(&case, &config, f64::MAX).unwrap();
                let second = run_benchmark(&case, &config, f64::MAX).unwrap();

                assert_eq!(first.x(), second.x());
                assert_eq!(first.trajectory(), second.trajectory());
            }
        }
    }

    #[test]
    fn descends() {
        for case in standard_cases()
            .into_iter()
            .filter(|case| case.objective().name() != "rosenbrock")
        {
            for config in standard_configs() {
                let report = run_benchmark(&case, &config, DEFAULT_TOLERANCE).unwrap();
                let trajectory = report.trajectory();
                assert!(trajectory.last() < trajectory.first());
            }
        }
    }

    #[test]
    fn inspects_every_iteration() {
        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
        let config = OptimizerConfig::new(Sgd::boxed, Hyperparams::new().with("lr", 0.1), 50);

        let mut iters = Vec::new();
        let mut values = Vec::new();
        let report = run_benchmark_with(&case, &config, DEFAULT_TOLERANCE, |iter, var, fx| {
            assert!(var.grad().is_some());
            iters.push(iter);
            values.push(fx);
        })
        .unwrap();

        assert_eq!(iters, (0..50).collect::<Vec<_>>());
        assert_eq!(values, report.trajectory().as_slice());
    }

    #[test]
    fn insufficient_iterations() {
        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
        let config = OptimizerConfig::new(
            Sgd::boxed,
            Hyperparams::new().with("lr", STANDARD_LR),
            10,
        );

        match run_benchmark(&case, &config, DEFAULT_TOLERANCE) {
            Err(BenchmarkError::ConvergenceFailure {
                actual,
                expected,
                tolerance,
            }) => {
                assert_eq!(actual.len(), 2);
                assert_eq!(expected, vec![0.0, 0.0]);
                assert_eq!(tolerance, DEFAULT_TOLERANCE);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn divergence() {
        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
        let config = OptimizerConfig::new(Sgd::boxed, Hyperparams::new().with("lr", 2.0), 1000);

        assert!(matches!(
            run_benchmark(&case, &config, DEFAULT_TOLERANCE),
            Err(BenchmarkError::ConvergenceFailure { .. })
        ));
    }

    struct Anonymous(Sgd);

    impl fmt::Display for Anonymous {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "gradient descent")
        }
    }

    impl Optimizer for Anonymous {
        fn name(&self) -> &'static str {
            "Anonymous"
        }

        fn order(&self) -> Order {
            self.0.order()
        }

        fn variable(&self) -> &Variable {
            self.0.variable()
        }

        fn zero_grad(&mut self) {
            self.0.zero_grad();
        }

        fn step(&mut self, closure: &mut Closure<'_>) -> Result<f64, OptimizerError> {
            self.0.step(closure)
        }
    }

    fn anonymous(
        variable: Variable,
        hyperparams: &Hyperparams,
    ) -> Result<Box<dyn Optimizer>, ConfigError> {
        Ok(Box::new(Anonymous(Sgd::from_hyperparams(
            variable,
            hyperparams,
        )?)))
    }

    #[test]
    fn self_description() {
        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
        let config = OptimizerConfig::new(anonymous, Hyperparams::new().with("lr", 0.1), 1000);

        match run_benchmark(&case, &config, DEFAULT_TOLERANCE) {
            Err(BenchmarkError::SelfDescriptionFailure { name, description }) => {
                assert_eq!(name, "Anonymous");
                assert_eq!(description, "gradient descent");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_setup() {
        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5], dvector![0.0, 0.0]);
        let config = OptimizerConfig::new(Newton::boxed, Hyperparams::new(), 0);
        assert!(matches!(
            run_benchmark(&case, &config, DEFAULT_TOLERANCE),
            Err(BenchmarkError::InvalidIterations)
        ));

        let config = OptimizerConfig::new(Newton::boxed, Hyperparams::new(), 10);
        assert!(matches!(
            run_benchmark(&case, &config, -1.0),
            Err(BenchmarkError::InvalidTolerance(_))
        ));

        let config = OptimizerConfig::new(Newton::boxed, Hyperparams::new().with("lr", 0.0), 10);
        assert!(matches!(
            run_benchmark(&case, &config, DEFAULT_TOLERANCE),
            Err(BenchmarkError::Config(ConfigError::InvalidValue { .. }))
        ));

        let case = BenchmarkCase::new(Basic, dvector![-1.0, 0.5, 0.0], dvector![0.0, 0.0]);
        assert!(matches!(
            run_benchmark(&case, &config, DEFAULT_TOLERANCE),
            Err(BenchmarkError::Problem(_))
        ));
    }

    #[test]
    fn closeness() {
        let zero = dvector![0.0, 0.0];
        assert!(all_close(&dvector![0.01, -0.01], &zero, 0.01, 0.0));
        assert!(!all_close(&dvector![0.02, 0.0], &zero, 0.01, 0.0));
        assert!(!all_close(&dvector![f64::NAN, 0.0], &zero, 0.01, 0.0));
        assert!(!all_close(&dvector![f64::INFINITY, 0.0], &zero, 0.01, 0.0));
        assert!(!all_close(&dvector![0.0], &zero, 0.01, 0.0));
        assert!(all_close(&dvector![100.5], &dvector![100.0], 0.0, 0.01));
    }

    #[test]
    fn case_id() {
        let case = BenchmarkCase::new(
            Rosenbrock::default(),
            dvector![1.5, 1.5],
            dvector![1.0, 1.0],
        );
        assert_eq!(case.to_string(), "rosenbrock (1.5, 1.5) -> (1, 1)");
    }

    #[test]
    fn trajectory_csv() {
        let mut trajectory = Trajectory::new();
        trajectory.push(1.25);
        trajectory.push(0.5);

        let mut out = Vec::new();
        trajectory.write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "iteration,value\n0,1.25\n1,0.5\n"
        );
    }
}
