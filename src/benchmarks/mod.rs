//! Benchmark driver for convolution kernel performance testing.
//!
//! Each registered (kernel, shape) pair becomes one [`ConfigurationRun`]:
//! the problem instance and kernel are built, optionally warmed up, timed by
//! an [`IterationTimer`] and released, strictly one configuration at a time.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod configuration_run;
pub mod performance_metrics;
pub mod verification;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{BenchmarkRunner, ConfigLoader, SkippedConfiguration, SuiteSummary};
pub use benchmark_types::{
    CANDIDATE_SHAPES, KernelShapes, PerformanceResults, REFERENCE_SHAPES, SuiteConfig,
};
pub use configuration_run::{ConfigurationReport, ConfigurationRun, RunState};
pub use performance_metrics::{
    FixedIterationTimer, IterationTimer, Measurement, print_performance_analysis,
    verify_outputs_match,
};
pub use verification::{VERIFY_TOLERANCE, Verification, verify_kernels_agree};
