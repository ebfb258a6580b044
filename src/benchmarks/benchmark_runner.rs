//! Core benchmark execution logic.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{PerformanceResults, SuiteConfig};
use super::configuration_run::{ConfigurationReport, ConfigurationRun};
use super::performance_metrics::{FixedIterationTimer, IterationTimer, print_performance_analysis};
use super::verification::{VERIFY_TOLERANCE, Verification, verify_kernels_agree};
use crate::adapters::KernelKind;
use crate::conv_shape::{ConvShape, ShapeEntry};
use crate::errors::ConvError;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    pub const SUITE_CONFIG_PATH: &'static str = "configs/conv_suite.json";

    /// Load a configuration file with fallback to defaults
    pub fn load_config<T: DeserializeOwned + Default>(
        path: &str,
        config_name: &str,
    ) -> BenchmarkResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load a configuration file that must exist.
    pub fn load_from_path<T: DeserializeOwned>(path: &str) -> BenchmarkResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BenchmarkError::ConfigFileNotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the convolution suite configuration
    pub fn load_suite_config() -> BenchmarkResult<SuiteConfig> {
        Self::load_config(Self::SUITE_CONFIG_PATH, "conv_suite")
    }

    fn parse<T: DeserializeOwned>(path: &str, content: &str) -> BenchmarkResult<T> {
        serde_json::from_str(content).map_err(|e| BenchmarkError::ConfigParseError {
            path: path.to_string(),
            source: e,
        })
    }
}

/// A configuration that was reported and not timed.
#[derive(Debug, Clone)]
pub struct SkippedConfiguration {
    pub kind: KernelKind,
    pub shape: ShapeEntry,
    pub reason: String,
}

/// Everything a suite run produced.
#[derive(Debug, Default)]
pub struct SuiteSummary {
    pub reports: Vec<ConfigurationReport>,
    pub skipped: Vec<SkippedConfiguration>,
    pub verification_failures: Vec<BenchmarkError>,
}

impl SuiteSummary {
    /// Measurements handed back by the timer, in run order.
    pub fn results(&self) -> Vec<PerformanceResults> {
        self.reports
            .iter()
            .filter_map(|report| report.results.clone())
            .collect()
    }

    pub fn num_timed(&self) -> usize {
        self.reports.len()
    }
}

/// Main benchmark runner
pub struct BenchmarkRunner {
    config: SuiteConfig,
}

impl BenchmarkRunner {
    pub fn new(config: SuiteConfig) -> BenchmarkResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runner over `configs/conv_suite.json`, or the built-in suite when the
    /// file is missing.
    pub fn from_default_config() -> BenchmarkResult<Self> {
        Self::new(ConfigLoader::load_suite_config()?)
    }

    /// Runner over a suite file that must exist.
    pub fn from_path(path: &str) -> BenchmarkResult<Self> {
        Self::new(ConfigLoader::load_from_path(path)?)
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// List registered configurations
    pub fn list_benchmarks(&self) {
        println!("Suite '{}': {}", self.config.name, self.config.description);
        println!("Available kernels:");
        for entry in &self.config.kernels {
            println!("  {} ({} shapes)", entry.kernel, entry.shapes.len());
            for shape in &entry.shapes {
                match ConvShape::try_from(*shape) {
                    Ok(valid) => println!("    {:<28} {}", shape.label(), valid),
                    Err(e) => println!("    {:<28} invalid: {}", shape.label(), e),
                }
            }
        }
    }

    /// Run every registered configuration
    pub fn run_all(&self) -> BenchmarkResult<SuiteSummary> {
        let mut kinds: Vec<KernelKind> = Vec::new();
        for entry in &self.config.kernels {
            if !kinds.contains(&entry.kernel) {
                kinds.push(entry.kernel);
            }
        }
        self.run_and_report(&kinds)
    }

    /// Run the shapes registered for one kernel
    pub fn run_kernel(&self, kind: KernelKind) -> BenchmarkResult<SuiteSummary> {
        if self.config.shapes_for(kind).is_empty() {
            return Err(BenchmarkError::BenchmarkExecutionError {
                benchmark_name: kind.to_string(),
                message: "No shapes registered for this kernel".to_string(),
            });
        }
        self.run_and_report(&[kind])
    }

    /// Run the shapes registered for the kernel with the given name
    pub fn run_benchmark(&self, kernel_name: &str) -> BenchmarkResult<SuiteSummary> {
        let kind =
            KernelKind::get_by_name(kernel_name).ok_or_else(|| BenchmarkError::UnknownKernel {
                name: kernel_name.to_string(),
            })?;
        self.run_kernel(kind)
    }

    fn run_and_report(&self, kinds: &[KernelKind]) -> BenchmarkResult<SuiteSummary> {
        info!("{}", "=".repeat(80));
        info!("Convolution Benchmark: {}", self.config.name);
        info!(
            "Warm-up iterations: {}, timed executions: {}",
            self.config.warmup_iterations, self.config.num_executions
        );
        info!("{}", "=".repeat(80));

        let mut timer =
            FixedIterationTimer::new(self.config.warmup_iterations, self.config.num_executions);
        let summary = self.run_configurations(kinds, &mut timer)?;

        print_performance_analysis(&summary.results());

        println!("\n{}", "=".repeat(80));
        println!(
            "Benchmark Complete: {} timed, {} skipped, {} verification failures",
            summary.num_timed(),
            summary.skipped.len(),
            summary.verification_failures.len()
        );
        println!("{}", "=".repeat(80));

        Ok(summary)
    }

    /// Runs the configurations of the given kernels one after another with
    /// the given timer.
    ///
    /// Configurations with an invalid shape or a shape the kernel rejects
    /// are logged and skipped. A fault while a kernel runs aborts the whole
    /// run.
    pub fn run_configurations<T: IterationTimer + ?Sized>(
        &self,
        kinds: &[KernelKind],
        timer: &mut T,
    ) -> BenchmarkResult<SuiteSummary> {
        let mut summary = SuiteSummary::default();

        if self.config.verify {
            self.verify_shapes(kinds, &mut summary)?;
        }

        for &kind in kinds {
            for entry in self.config.shapes_for(kind) {
                let prepared = ConvShape::try_from(entry)
                    .map_err(ConvError::from)
                    .and_then(|shape| ConfigurationRun::prepare(kind, shape, &self.config.instance));
                let run = match prepared {
                    Ok(run) => run,
                    Err(e) => {
                        skip_or_abort(&mut summary, kind, entry, e)?;
                        continue;
                    }
                };

                let label = run.label();
                match run.execute(&mut *timer) {
                    Ok(report) => {
                        debug!("[{}] completed", label);
                        summary.reports.push(report);
                    }
                    Err(e) => {
                        error!("[{}] kernel fault, aborting run: {}", label, e);
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(summary)
    }

    fn verify_shapes(
        &self,
        kinds: &[KernelKind],
        summary: &mut SuiteSummary,
    ) -> BenchmarkResult<()> {
        info!("Verifying output consistency between reference and candidate kernels...");

        let mut verified: Vec<ConvShape> = Vec::new();
        for &kind in kinds {
            for entry in self.config.shapes_for(kind) {
                // Unconvertible entries are skipped when their configuration
                // is prepared.
                let Ok(shape) = ConvShape::try_from(entry) else {
                    continue;
                };
                if verified.contains(&shape) {
                    continue;
                }
                verified.push(shape);

                match verify_kernels_agree(shape, VERIFY_TOLERANCE) {
                    Ok(Verification::Agreed { .. }) | Ok(Verification::Skipped) => {}
                    Err(e @ BenchmarkError::VerificationFailed { .. }) => {
                        error!("❌ {}", e);
                        summary.verification_failures.push(e);
                    }
                    // An invalid or rejected shape is reported when its
                    // configuration is prepared.
                    Err(BenchmarkError::Conv { source }) if source.is_recoverable() => {}
                    Err(e) => {
                        error!("Verification of [{}] aborted: {}", shape, e);
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }
}

fn skip_or_abort(
    summary: &mut SuiteSummary,
    kind: KernelKind,
    shape: ShapeEntry,
    error: ConvError,
) -> BenchmarkResult<()> {
    if !error.is_recoverable() {
        error!("[{}/{}] fatal error: {}", kind, shape.label(), error);
        return Err(error.into());
    }

    warn!("Skipping [{}/{}]: {}", kind, shape.label(), error);
    summary.skipped.push(SkippedConfiguration {
        kind,
        shape,
        reason: error.to_string(),
    });
    Ok(())
}
