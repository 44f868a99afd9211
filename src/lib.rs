#![allow(clippy::many_single_char_names)]
#![warn(missing_docs)]

//! # Curvebench
//!
//! A pure Rust harness for benchmarking the convergence of gradient-based
//! optimizers on classic test functions with analytically known minima.
//!
//! The harness runs an optimizer for a fixed number of iterations from a fixed
//! initial point and checks that it ended up close to the minimum. Optimizers
//! are pluggable: anything that implements the [`Optimizer`] trait can be
//! benchmarked, the crate ships [stochastic gradient descent](algo::sgd) and a
//! [damped Newton method](algo::newton).
//!
//! ## Objective
//!
//! An objective is a scalar function of *n* variables, written once generically
//! over the [`Real`](derivatives::Real) scalar type. The generic formulation is
//! what allows to compute exact gradients and Hessian matrices by forward-mode
//! automatic differentiation, there is no need to derive them by hand.
//!
//! ```rust
//! use curvebench::derivatives::Real;
//! use curvebench::{Objective, Problem};
//!
//! // https://en.wikipedia.org/wiki/Himmelblau%27s_function
//! struct Himmelblau;
//!
//! impl Problem for Himmelblau {
//!     fn dim(&self) -> usize {
//!         2
//!     }
//!
//!     fn name(&self) -> &str {
//!         "himmelblau"
//!     }
//! }
//!
//! impl Objective for Himmelblau {
//!     fn eval<T: Real>(&self, x: &[T]) -> T {
//!         let a = x[0] * x[0] + x[1] - T::constant(11.0);
//!         let b = x[0] + x[1] * x[1] - T::constant(7.0);
//!         a * a + b * b
//!     }
//! }
//! ```
//!
//! ## Benchmarking
//!
//! A [`BenchmarkCase`](harness::BenchmarkCase) pairs the objective with the
//! initial point and the expected minimum. An
//! [`OptimizerConfig`](harness::OptimizerConfig) holds the optimizer factory,
//! its hyperparameters and the number of iterations.
//!
//! ```rust
//! use curvebench::algo::Sgd;
//! use curvebench::harness::{BenchmarkCase, OptimizerConfig};
//! use curvebench::nalgebra::dvector;
//! use curvebench::{run_benchmark, Hyperparams};
//! # use curvebench::derivatives::Real;
//! # use curvebench::{Objective, Problem};
//! #
//! # struct Himmelblau;
//! #
//! # impl Problem for Himmelblau {
//! #     fn dim(&self) -> usize {
//! #         2
//! #     }
//! #
//! #     fn name(&self) -> &str {
//! #         "himmelblau"
//! #     }
//! # }
//! #
//! # impl Objective for Himmelblau {
//! #     fn eval<T: Real>(&self, x: &[T]) -> T {
//! #         let a = x[0] * x[0] + x[1] - T::constant(11.0);
//! #         let b = x[0] + x[1] * x[1] - T::constant(7.0);
//! #         a * a + b * b
//! #     }
//! # }
//!
//! let case = BenchmarkCase::new(Himmelblau, dvector![2.5, 2.5], dvector![3.0, 2.0]);
//! let config = OptimizerConfig::new(Sgd::boxed, Hyperparams::new().with("lr", 0.01), 1000);
//!
//! match run_benchmark(&case, &config, 1e-3) {
//!     Ok(report) => println!("{} converged to {:?}", report.description(), report.x()),
//!     Err(error) => println!("{}", error),
//! }
//! ```
//!
//! The standard benchmark set (paraboloid, Rosenbrock function and scaled
//! quadratic) together with the standard configurations is available in the
//! [`testing`] module.
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod derivatives;
pub mod harness;
pub mod testing;

pub use self::core::*;
pub use harness::{run_benchmark, run_benchmark_with, BenchmarkError};

pub use nalgebra;
