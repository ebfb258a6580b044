//! Benchmark type definitions and configuration structures.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use crate::adapters::KernelKind;
use crate::conv_shape::{ConvShape, ShapeEntry};
use crate::problem_instance::InstanceOptions;
use serde::{Deserialize, Serialize};

/// Shapes registered for one kernel, benchmarked in the listed order.
///
/// Entries are kept as written in the suite file. Each one is converted to a
/// [`ConvShape`] when its configuration is prepared, so a bad entry only
/// skips that configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelShapes {
    pub kernel: KernelKind,
    pub shapes: Vec<ShapeEntry>,
}

/// Configuration for a convolution benchmark suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub name: String,
    pub description: String,
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: u32,
    pub num_executions: u32,
    /// Cross-check kernel outputs before timing shapes both kernels accept.
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub instance: InstanceOptions,
    pub kernels: Vec<KernelShapes>,
}

fn default_warmup_iterations() -> u32 {
    3
}

/// Shapes timed on the reference kernel: N in-dim in-chan out-chan kern-dim pad stride
pub const REFERENCE_SHAPES: [ConvShape; 5] = [
    ConvShape::new(4, 224, 3, 64, 7, 3, 2),    // conv1
    ConvShape::new(4, 56, 64, 64, 3, 1, 1),    // conv3/7/10
    ConvShape::new(4, 28, 128, 128, 3, 1, 2),  // conv13
    ConvShape::new(4, 56, 64, 64, 3, 0, 1),    // test size
    ConvShape::new(5, 102, 128, 128, 3, 0, 1), // halide size
];

/// Shapes timed on the candidate kernel, which supports neither padding nor stride.
pub const CANDIDATE_SHAPES: [ConvShape; 2] = [
    ConvShape::new(4, 56, 64, 64, 3, 0, 1),    // test size
    ConvShape::new(5, 102, 128, 128, 3, 0, 1), // halide size
];

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            name: "conv2d".to_string(),
            description: "Reference operator primitive vs direct candidate kernel".to_string(),
            warmup_iterations: default_warmup_iterations(),
            num_executions: 20,
            verify: true,
            instance: InstanceOptions::default(),
            kernels: vec![
                KernelShapes {
                    kernel: KernelKind::Reference,
                    shapes: REFERENCE_SHAPES.map(ShapeEntry::from).to_vec(),
                },
                KernelShapes {
                    kernel: KernelKind::Candidate,
                    shapes: CANDIDATE_SHAPES.map(ShapeEntry::from).to_vec(),
                },
            ],
        }
    }
}

impl SuiteConfig {
    /// Validates the configuration.
    ///
    /// Individual shapes are not checked here: an invalid shape is reported
    /// and skipped when its configuration is built.
    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.num_executions == 0 {
            return Err(BenchmarkError::InvalidNumExecutions {
                value: self.num_executions,
            });
        }

        if self.kernels.is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: "kernels".to_string(),
                message: "At least one kernel must be registered".to_string(),
            });
        }

        for (i, entry) in self.kernels.iter().enumerate() {
            if entry.shapes.is_empty() {
                return Err(BenchmarkError::ConfigValidationError {
                    field: format!("kernels[{}].shapes", i),
                    message: format!("Kernel '{}' has no shapes registered", entry.kernel),
                });
            }
        }

        if !self.instance.scale.is_finite() {
            return Err(BenchmarkError::ConfigValidationError {
                field: "instance.scale".to_string(),
                message: "Scale must be a finite number".to_string(),
            });
        }

        Ok(())
    }

    /// Shapes registered for the given kernel, in registration order.
    pub fn shapes_for(&self, kernel: KernelKind) -> Vec<ShapeEntry> {
        self.kernels
            .iter()
            .filter(|entry| entry.kernel == kernel)
            .flat_map(|entry| entry.shapes.iter().copied())
            .collect()
    }

    /// Total number of (kernel, shape) configurations.
    pub fn num_configurations(&self) -> usize {
        self.kernels.iter().map(|entry| entry.shapes.len()).sum()
    }
}

/// Performance measurement structure
#[derive(Debug, Clone)]
pub struct PerformanceResults {
    pub method: String,
    pub shape: ConvShape,
    pub total_time_ns: u128,
    pub average_time_ns: u128,
    pub average_time_ms: f64,
    pub num_executions: u32,
    pub flops_per_execution: u64,
}

impl PerformanceResults {
    pub fn new(
        method: String,
        shape: ConvShape,
        total_time_ns: u128,
        num_executions: u32,
        flops_per_execution: u64,
    ) -> Self {
        let average_time_ns = total_time_ns / num_executions.max(1) as u128;
        let average_time_ms = average_time_ns as f64 / 1_000_000.0;

        Self {
            method,
            shape,
            total_time_ns,
            average_time_ns,
            average_time_ms,
            num_executions,
            flops_per_execution,
        }
    }

    /// Sustained throughput in GFLOP/s.
    pub fn gflops(&self) -> f64 {
        if self.average_time_ns == 0 {
            return 0.0;
        }
        // flops per nanosecond is GFLOP/s
        self.flops_per_execution as f64 / self.average_time_ns as f64
    }

    pub fn overhead_ratio(&self, baseline: &PerformanceResults) -> f64 {
        self.average_time_ns as f64 / baseline.average_time_ns as f64
    }

    pub fn overhead_percentage(&self, baseline: &PerformanceResults) -> f64 {
        (self.overhead_ratio(baseline) - 1.0) * 100.0
    }
}
