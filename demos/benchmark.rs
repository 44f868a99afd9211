use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use curvebench::harness::{run_benchmark, DEFAULT_TOLERANCE};
use curvebench::testing::{standard_cases, standard_configs};
use curvebench::Problem;

// Runs the standard benchmark set. If a directory is given as the first
// argument, the trajectories are written there as CSV files.
fn main() -> Result<(), String> {
    let out_dir = std::env::args().nth(1).map(PathBuf::from);
    let mut failures = 0;

    for case in standard_cases() {
        for config in standard_configs() {
            match run_benchmark(&case, &config, DEFAULT_TOLERANCE) {
                Ok(report) => {
                    println!(
                        "{}\t{}\tx = {:?}\tf(x) = {:?}",
                        case,
                        report.description(),
                        report.x().as_slice(),
                        report.trajectory().last()
                    );

                    if let Some(dir) = &out_dir {
                        let path = dir.join(format!(
                            "{}_{}.csv",
                            case.objective().name(),
                            report.name().to_lowercase()
                        ));
                        let file = File::create(&path)
                            .map_err(|error| format!("{}: {error}", path.display()))?;
                        report
                            .trajectory()
                            .write_csv(BufWriter::new(file))
                            .map_err(|error| format!("{}: {error}", path.display()))?;
                    }
                }
                Err(error) => {
                    println!("{}\t{:?}\tfailed: {error}", case, config);
                    failures += 1;
                }
            }
        }
    }

    if failures == 0 {
        Ok(())
    } else {
        Err(format!("{failures} benchmarks did not converge"))
    }
}
