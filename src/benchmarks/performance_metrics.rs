//! Performance measurement utilities for benchmarks.

use super::benchmark_types::PerformanceResults;
use crate::errors::ConvResult;
use log::{debug, info};
use std::time::{Duration, Instant};

/// Wall-clock total of a timed loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub total: Duration,
    pub iterations: u32,
}

/// The timing side of a benchmark: decides how many times a routine runs and
/// measures it.
///
/// An error returned by the routine stops the loop immediately and is passed
/// through unchanged.
pub trait IterationTimer {
    /// Whether [`warm_up`](Self::warm_up) runs the routine at all.
    fn warms_up(&self) -> bool {
        false
    }

    /// Runs the routine untimed. Only called when [`warms_up`](Self::warms_up)
    /// is true.
    fn warm_up(&mut self, _routine: &mut dyn FnMut() -> ConvResult<()>) -> ConvResult<()> {
        Ok(())
    }

    /// Times the routine. Returns `None` when the timer reports its
    /// measurements itself instead of handing them back.
    fn measure(
        &mut self,
        label: &str,
        routine: &mut dyn FnMut() -> ConvResult<()>,
    ) -> ConvResult<Option<Measurement>>;
}

/// Runs a fixed number of warm-up and timed executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIterationTimer {
    pub warmup_iterations: u32,
    pub num_executions: u32,
}

impl FixedIterationTimer {
    pub fn new(warmup_iterations: u32, num_executions: u32) -> Self {
        Self {
            warmup_iterations,
            num_executions,
        }
    }
}

impl IterationTimer for FixedIterationTimer {
    fn warms_up(&self) -> bool {
        self.warmup_iterations > 0
    }

    fn warm_up(&mut self, routine: &mut dyn FnMut() -> ConvResult<()>) -> ConvResult<()> {
        for _ in 0..self.warmup_iterations {
            routine()?;
        }
        Ok(())
    }

    fn measure(
        &mut self,
        label: &str,
        routine: &mut dyn FnMut() -> ConvResult<()>,
    ) -> ConvResult<Option<Measurement>> {
        info!("Benchmarking {} ({} executions)...", label, self.num_executions);

        let progress_step = (self.num_executions / 10).max(1);
        let start = Instant::now();
        for i in 0..self.num_executions {
            routine()?;
            if (i + 1) % progress_step == 0 {
                debug!("  Progress: {}/{}", i + 1, self.num_executions);
            }
        }

        Ok(Some(Measurement {
            total: start.elapsed(),
            iterations: self.num_executions,
        }))
    }
}

/// Prints detailed performance analysis, one block per shape.
pub fn print_performance_analysis(results: &[PerformanceResults]) {
    if results.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(80));
    println!("Detailed Results");
    println!("{}", "=".repeat(80));

    let mut shapes = Vec::new();
    for result in results {
        if !shapes.contains(&result.shape) {
            shapes.push(result.shape);
        }
    }

    for shape in shapes {
        let shape_results: Vec<&PerformanceResults> =
            results.iter().filter(|r| r.shape == shape).collect();

        println!("\n📐 {}", shape);
        for result in &shape_results {
            println!("   📊 {}", result.method);
            println!(
                "      Average time: {:.3} ms ({} ns)",
                result.average_time_ms, result.average_time_ns
            );
            println!(
                "      Total time: {:.3} ms",
                result.total_time_ns as f64 / 1_000_000.0
            );
            println!("      Executions: {}", result.num_executions);
            println!("      Throughput: {:.2} GFLOP/s", result.gflops());
        }

        let reference = shape_results.iter().find(|r| r.method == "reference");
        let candidate = shape_results.iter().find(|r| r.method == "candidate");
        if let (Some(reference), Some(candidate)) = (reference, candidate) {
            println!(
                "   📈 Candidate vs Reference: {:.2}x time ({:+.1}%)",
                candidate.overhead_ratio(reference),
                candidate.overhead_percentage(reference)
            );
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("Performance Analysis");
    println!("{}", "=".repeat(80));

    println!("\n🚀 Throughput Rankings (highest to lowest):");
    let mut sorted_results = results.to_vec();
    sorted_results.sort_by(|a, b| b.gflops().total_cmp(&a.gflops()));

    for (i, result) in sorted_results.iter().enumerate() {
        let rank_emoji = match i {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "  ",
        };
        println!(
            "   {} {} [{}]: {:.2} GFLOP/s",
            rank_emoji,
            result.method,
            result.shape.label(),
            result.gflops()
        );
    }
}

/// Compares two outputs element-wise with a tolerance relative to the
/// magnitude of the expected value. Returns the largest absolute difference on
/// success and a description of the first mismatch otherwise.
pub fn verify_outputs_match(
    expected: &[f32],
    actual: &[f32],
    tolerance: f32,
) -> Result<f32, String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "length mismatch: expected {} elements, got {}",
            expected.len(),
            actual.len()
        ));
    }

    let mut max_diff = 0.0f32;
    for (i, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
        let diff = (e - a).abs();
        if !(diff <= tolerance * e.abs().max(1.0)) {
            return Err(format!(
                "element {}: expected={}, actual={}, diff={}",
                i, e, a, diff
            ));
        }
        max_diff = max_diff.max(diff);
    }
    Ok(max_diff)
}
