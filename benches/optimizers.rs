use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curvebench::{
    derivatives::{gradient, hessian},
    harness::{run_benchmark, BenchmarkCase, OptimizerConfig, DEFAULT_TOLERANCE},
    nalgebra::dvector,
    testing::*,
    Problem, Variable,
};

fn optimizer_name(config: &OptimizerConfig, case: &BenchmarkCase<StandardFunction>) -> &'static str {
    let variable = Variable::from_vector(case.initial().clone());
    (config.factory())(variable, config.hyperparams())
        .map(|optimizer| optimizer.name())
        .unwrap_or("invalid")
}

fn bench_case(c: &mut Criterion, case: &BenchmarkCase<StandardFunction>) {
    for config in standard_configs() {
        let name = optimizer_name(&config, case);

        c.bench_function(&format!("{} {}", name, case.objective().name()), |b| {
            b.iter(|| assert!(run_benchmark(case, &config, DEFAULT_TOLERANCE).is_ok()))
        });
    }
}

fn standard(c: &mut Criterion) {
    for case in standard_cases() {
        bench_case(c, &case);
    }
}

fn short_runs(c: &mut Criterion) {
    let case = BenchmarkCase::new(
        StandardFunction::Rosenbrock(Rosenbrock::default()),
        dvector![1.5, 1.5],
        dvector![1.0, 1.0],
    );

    for config in standard_configs() {
        let name = optimizer_name(&config, &case);
        let config = OptimizerConfig::new(config.factory(), config.hyperparams().clone(), 100);

        c.bench_function(&format!("{} rosenbrock 100 iterations", name), |b| {
            b.iter(|| run_benchmark(&case, &config, f64::MAX))
        });
    }
}

fn derivatives(c: &mut Criterion) {
    let f = Rosenbrock::default();
    let x = dvector![1.5, 1.5];

    c.bench_function("gradient rosenbrock", |b| {
        b.iter(|| gradient(&f, black_box(&x)))
    });

    c.bench_function("hessian rosenbrock", |b| {
        b.iter(|| hessian(&f, black_box(&x)))
    });
}

criterion_group!(optimizers, standard, short_runs, derivatives);
criterion_main!(optimizers);
