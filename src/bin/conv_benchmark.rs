//! Convolution benchmark CLI executable.

use convbench::benchmarks::{BenchmarkError, BenchmarkResult, BenchmarkRunner, SuiteSummary};
use log::error;
use std::env;

fn main() {
    // Initialize logger
    env_logger::init();

    let result = run_benchmarks();

    if let Err(e) = result {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

fn run_benchmarks() -> BenchmarkResult<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let runner = match take_option(&mut args, "--config")? {
        Some(path) => BenchmarkRunner::from_path(&path)?,
        None => BenchmarkRunner::from_default_config()?,
    };

    let summary = match args.as_slice() {
        [] => runner.run_all()?,
        [flag] if flag == "--list" => {
            runner.list_benchmarks();
            return Ok(());
        }
        [flag] if flag == "--help" || flag == "-h" => {
            print_usage();
            return Ok(());
        }
        [flag, kernel] if flag == "--kernel" => runner.run_benchmark(kernel)?,
        [kernel] if !kernel.starts_with("--") => runner.run_benchmark(kernel)?,
        _ => {
            print_usage();
            return Ok(());
        }
    };

    check_verification(summary)
}

/// Removes `name <value>` from the arguments and returns the value.
fn take_option(args: &mut Vec<String>, name: &str) -> BenchmarkResult<Option<String>> {
    let Some(pos) = args.iter().position(|arg| arg == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(BenchmarkError::ConfigValidationError {
            field: name.to_string(),
            message: "Missing value".to_string(),
        });
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn check_verification(summary: SuiteSummary) -> BenchmarkResult<()> {
    match summary.verification_failures.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --bin conv_benchmark --release                     # Run all kernels");
    println!("  cargo run --bin conv_benchmark --release -- --list           # List configurations");
    println!("  cargo run --bin conv_benchmark --release -- <kernel>         # Run one kernel");
    println!("  cargo run --bin conv_benchmark --release -- --kernel <kernel>");
    println!("  cargo run --bin conv_benchmark --release -- --config <path> [...]");
    println!();
    println!("Available kernels:");
    println!("  reference - Operator primitive, described and bound once");
    println!("  candidate - Direct kernel with a flat argument list (no padding, unit stride)");
}
