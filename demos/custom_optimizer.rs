use std::fmt;

use curvebench::derivatives::{Order, Real};
use curvebench::harness::{BenchmarkCase, OptimizerConfig};
use curvebench::nalgebra::{dvector, DVector};
use curvebench::{
    run_benchmark, Closure, ConfigError, Hyperparams, Objective, Optimizer, OptimizerError,
    Problem, Variable,
};

// Gradient descent with per-coordinate step sizes scaled by the history of
// squared gradients.
struct Adagrad {
    lr: f64,
    variable: Variable,
    sum: DVector<f64>,
}

impl Adagrad {
    const NAME: &'static str = "Adagrad";

    fn boxed(variable: Variable, hp: &Hyperparams) -> Result<Box<dyn Optimizer>, ConfigError> {
        let lr = hp.get("lr").unwrap_or(0.1);
        if lr <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "lr".to_string(),
                value: lr,
            });
        }

        let sum = DVector::zeros(variable.dim());
        Ok(Box::new(Self { lr, variable, sum }))
    }
}

impl fmt::Display for Adagrad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (lr: {})", Self::NAME, self.lr)
    }
}

impl Optimizer for Adagrad {
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
        let fx = closure(&mut self.variable)?;
        let grad = self
            .variable
            .grad()
            .cloned()
            .ok_or(OptimizerError::MissingGradient)?;

        self.sum += grad.component_mul(&grad);
        let scaled = grad.zip_map(&self.sum, |gi, si| gi / (si.sqrt() + 1e-10));
        self.variable.value_mut().axpy(-self.lr, &scaled, 1.0);

        Ok(fx)
    }
}

// https://en.wikipedia.org/wiki/Rosenbrock_function
struct Rosenbrock {
    a: f64,
    b: f64,
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

fn main() {
    let f = Rosenbrock { a: 1.0, b: 1.0 };
    let case = BenchmarkCase::new(f, dvector![-1.0, 2.0], dvector![1.0, 1.0]);
    let config = OptimizerConfig::new(Adagrad::boxed, Hyperparams::new().with("lr", 0.5), 5000);

    match run_benchmark(&case, &config, 0.01) {
        Ok(report) => {
            for (iter, fx) in report.trajectory().iter().enumerate().step_by(500) {
                println!("iter = {}\tf(x) = {}", iter, fx);
            }
            println!("{} converged to {:?}", report.description(), report.x().as_slice());
        }
        Err(error) => println!("{}: {}", case, error),
    }
}
