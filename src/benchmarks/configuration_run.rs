//! A single benchmark configuration: one kernel, one shape, one instance.
//!
//! A run moves strictly through `Building -> WarmingUp (optional) -> Timing
//! -> Done`. Preparing builds the problem instance and binds the kernel, so
//! all setup cost is paid before timing starts. Executing consumes the run:
//! the instance and every kernel resource are released when it returns.

use super::benchmark_types::PerformanceResults;
use super::performance_metrics::IterationTimer;
use crate::adapters::{ConvKernel, KernelKind};
use crate::conv_shape::ConvShape;
use crate::errors::ConvResult;
use crate::problem_instance::{InstanceOptions, ProblemInstance};
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Building,
    WarmingUp,
    Timing,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Building => "building",
            RunState::WarmingUp => "warming up",
            RunState::Timing => "timing",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of an executed configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationReport {
    pub kind: KernelKind,
    pub shape: ConvShape,
    /// Every state the run passed through, in order.
    pub states: Vec<RunState>,
    /// `None` when the timer reported its measurements itself.
    pub results: Option<PerformanceResults>,
}

/// A prepared configuration, owning its problem instance through its kernel.
pub struct ConfigurationRun {
    kind: KernelKind,
    shape: ConvShape,
    flops: u64,
    kernel: Box<dyn ConvKernel>,
    states: Vec<RunState>,
}

impl ConfigurationRun {
    /// Builds the problem instance and binds the kernel to it.
    ///
    /// Fails with `InvalidShape` or `KernelRejected`; both only concern this
    /// configuration.
    pub fn prepare(
        kind: KernelKind,
        shape: ConvShape,
        options: &InstanceOptions,
    ) -> ConvResult<Self> {
        debug!("[{} {}] {}", kind, shape.label(), RunState::Building);
        let instance = ProblemInstance::build_with(shape, options)?;
        let flops = shape.flops()?;
        let kernel = kind.create(instance)?;

        Ok(Self {
            kind,
            shape,
            flops,
            kernel,
            states: vec![RunState::Building],
        })
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    pub fn shape(&self) -> &ConvShape {
        &self.shape
    }

    pub fn state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Building)
    }

    pub fn kernel(&self) -> &dyn ConvKernel {
        self.kernel.as_ref()
    }

    /// Label used for timing output, e.g. `reference/n4_i56_c64_o64_k3_p1_s1`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.kind, self.shape.label())
    }

    fn enter(&mut self, next: RunState) {
        debug_assert!(next > self.state());
        debug!("[{}] {} -> {}", self.label(), self.state(), next);
        self.states.push(next);
    }

    /// Warms up (if the timer does) and times the kernel.
    ///
    /// Any error here is a fault inside the measured loop and must be treated
    /// as fatal by the caller.
    pub fn execute<T: IterationTimer + ?Sized>(
        mut self,
        timer: &mut T,
    ) -> ConvResult<ConfigurationReport> {
        let label = self.label();

        if timer.warms_up() {
            self.enter(RunState::WarmingUp);
            let kernel = &mut self.kernel;
            timer.warm_up(&mut || kernel.run())?;
        }

        self.enter(RunState::Timing);
        let measurement = {
            let kernel = &mut self.kernel;
            timer.measure(&label, &mut || kernel.run())?
        };

        self.enter(RunState::Done);
        let results = measurement.map(|m| {
            PerformanceResults::new(
                self.kind.name().to_string(),
                self.shape,
                m.total.as_nanos(),
                m.iterations,
                self.flops,
            )
        });

        Ok(ConfigurationReport {
            kind: self.kind,
            shape: self.shape,
            states: self.states,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::performance_metrics::{FixedIterationTimer, Measurement};
    use crate::errors::ConvError;
    use std::time::Duration;

    /// Times once and never warms up, but counts any warm-up call it gets.
    #[derive(Default)]
    struct MeasureOnceTimer {
        warm_up_calls: u32,
        runs: u32,
    }

    impl IterationTimer for MeasureOnceTimer {
        fn warm_up(&mut self, _routine: &mut dyn FnMut() -> ConvResult<()>) -> ConvResult<()> {
            self.warm_up_calls += 1;
            Ok(())
        }

        fn measure(
            &mut self,
            _label: &str,
            routine: &mut dyn FnMut() -> ConvResult<()>,
        ) -> ConvResult<Option<Measurement>> {
            routine()?;
            self.runs += 1;
            Ok(Some(Measurement {
                total: Duration::from_nanos(1),
                iterations: 1,
            }))
        }
    }

    #[test]
    fn test_state_sequence_with_warm_up() {
        let run = ConfigurationRun::prepare(
            KernelKind::Reference,
            ConvShape::new(1, 6, 2, 2, 3, 1, 1),
            &InstanceOptions::default(),
        )
        .unwrap();
        assert_eq!(run.state(), RunState::Building);

        let report = run.execute(&mut FixedIterationTimer::new(1, 2)).unwrap();
        assert_eq!(
            report.states,
            vec![
                RunState::Building,
                RunState::WarmingUp,
                RunState::Timing,
                RunState::Done
            ]
        );
        let results = report.results.unwrap();
        assert_eq!(results.method, "reference");
        assert_eq!(results.num_executions, 2);
    }

    #[test]
    fn test_state_sequence_without_warm_up() {
        let run = ConfigurationRun::prepare(
            KernelKind::Candidate,
            ConvShape::new(1, 6, 2, 2, 3, 0, 1),
            &InstanceOptions::default(),
        )
        .unwrap();
        let report = run.execute(&mut FixedIterationTimer::new(0, 1)).unwrap();
        assert_eq!(
            report.states,
            vec![RunState::Building, RunState::Timing, RunState::Done]
        );
    }

    #[test]
    fn test_timer_without_warm_up_never_enters_warming_up() {
        let run = ConfigurationRun::prepare(
            KernelKind::Reference,
            ConvShape::new(1, 6, 2, 2, 3, 1, 1),
            &InstanceOptions::default(),
        )
        .unwrap();
        let mut timer = MeasureOnceTimer::default();
        let report = run.execute(&mut timer).unwrap();

        assert_eq!(timer.warm_up_calls, 0);
        assert_eq!(timer.runs, 1);
        assert!(!report.states.contains(&RunState::WarmingUp));
        assert_eq!(
            report.states,
            vec![RunState::Building, RunState::Timing, RunState::Done]
        );
    }

    #[test]
    fn test_prepare_surfaces_recoverable_errors() {
        let invalid = ConfigurationRun::prepare(
            KernelKind::Reference,
            ConvShape::new(1, 3, 1, 1, 5, 0, 1),
            &InstanceOptions::default(),
        );
        assert!(matches!(invalid, Err(ConvError::InvalidShape(_))));

        let rejected = ConfigurationRun::prepare(
            KernelKind::Candidate,
            ConvShape::new(1, 8, 1, 1, 3, 1, 1),
            &InstanceOptions::default(),
        );
        match rejected {
            Err(err) => assert!(err.is_recoverable()),
            Ok(_) => panic!("padded shape must be rejected by the candidate kernel"),
        }
    }
}
