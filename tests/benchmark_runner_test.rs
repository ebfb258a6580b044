//! Tests for suite configuration loading and the sequential benchmark driver.

use convbench::benchmarks::{
    BenchmarkError, BenchmarkRunner, ConfigLoader, FixedIterationTimer, KernelShapes,
    RunState, SuiteConfig,
};
use convbench::{ConvShape, KernelKind};
use std::fs;
use std::path::PathBuf;

fn write_temp_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("convbench_{}_{}.json", name, std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

fn tiny_suite(verify: bool) -> SuiteConfig {
    SuiteConfig {
        name: "tiny".to_string(),
        description: "driver test".to_string(),
        warmup_iterations: 1,
        num_executions: 3,
        verify,
        kernels: vec![
            KernelShapes {
                kernel: KernelKind::Reference,
                shapes: vec![
                    ConvShape::new(1, 9, 2, 3, 3, 1, 2).into(),
                    ConvShape::new(2, 6, 2, 3, 3, 0, 1).into(),
                ],
            },
            KernelShapes {
                kernel: KernelKind::Candidate,
                shapes: vec![
                    ConvShape::new(2, 6, 2, 3, 3, 1, 1).into(),
                    ConvShape::new(2, 6, 2, 3, 3, 0, 1).into(),
                ],
            },
        ],
        ..SuiteConfig::default()
    }
}

#[test]
fn test_shipped_suite_file_matches_built_in_default() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/conv_suite.json");
    let config: SuiteConfig = ConfigLoader::load_from_path(path).unwrap();
    config.validate().unwrap();
    assert_eq!(config, SuiteConfig::default());
}

#[test]
fn test_loads_suite_from_file() {
    let path = write_temp_config(
        "load",
        r#"{
            "name": "file",
            "description": "from disk",
            "warmup_iterations": 0,
            "num_executions": 2,
            "instance": {"scale": 0.5, "init": "pattern"},
            "kernels": [
                {"kernel": "reference", "shapes": [
                    {"batch":1,"in_dim":5,"in_channels":1,"out_channels":1,"kernel_size":3,"padding":1,"stride":1}
                ]}
            ]
        }"#,
    );

    let runner = BenchmarkRunner::from_path(path.to_str().unwrap()).unwrap();
    assert_eq!(runner.config().name, "file");
    assert_eq!(runner.config().instance.scale, 0.5);
    assert_eq!(runner.config().num_configurations(), 1);
    fs::remove_file(path).unwrap();
}

#[test]
fn test_negative_padding_skips_only_that_shape() {
    let path = write_temp_config(
        "negative",
        r#"{
            "name": "signed",
            "description": "one bad shape",
            "warmup_iterations": 0,
            "num_executions": 1,
            "verify": true,
            "kernels": [
                {"kernel": "reference", "shapes": [
                    {"batch":1,"in_dim":8,"in_channels":1,"out_channels":1,"kernel_size":3,"padding":-1,"stride":1},
                    {"batch":1,"in_dim":8,"in_channels":1,"out_channels":1,"kernel_size":3,"padding":1,"stride":1}
                ]}
            ]
        }"#,
    );

    let runner = BenchmarkRunner::from_path(path.to_str().unwrap()).unwrap();
    fs::remove_file(path).unwrap();
    assert_eq!(runner.config().num_configurations(), 2);

    let mut timer = FixedIterationTimer::new(0, 1);
    let summary = runner
        .run_configurations(&[KernelKind::Reference], &mut timer)
        .unwrap();

    assert_eq!(summary.num_timed(), 1);
    assert_eq!(summary.reports[0].shape, ConvShape::new(1, 8, 1, 1, 3, 1, 1));
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].shape.padding, -1);
    assert!(summary.skipped[0].reason.contains("padding"));
    assert!(summary.verification_failures.is_empty());
}

#[test]
fn test_malformed_suite_file_is_a_parse_error() {
    let path = write_temp_config("malformed", "{ \"name\": ");
    let result = BenchmarkRunner::from_path(path.to_str().unwrap());
    assert!(matches!(result, Err(BenchmarkError::ConfigParseError { .. })));
    fs::remove_file(path).unwrap();
}

#[test]
fn test_invalid_suite_is_rejected_before_running() {
    let path = write_temp_config(
        "invalid",
        r#"{"name": "x", "description": "y", "num_executions": 0, "kernels": []}"#,
    );
    let result = BenchmarkRunner::from_path(path.to_str().unwrap());
    assert!(matches!(
        result,
        Err(BenchmarkError::InvalidNumExecutions { value: 0 })
    ));
    fs::remove_file(path).unwrap();
}

#[test]
fn test_suite_runs_sequentially_and_skips_rejected_shapes() {
    let runner = BenchmarkRunner::new(tiny_suite(true)).unwrap();
    let mut timer = FixedIterationTimer::new(1, 3);
    let summary = runner
        .run_configurations(&KernelKind::ALL, &mut timer)
        .unwrap();

    assert_eq!(summary.num_timed(), 3);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].kind, KernelKind::Candidate);
    assert!(summary.verification_failures.is_empty());

    let order: Vec<(KernelKind, ConvShape)> =
        summary.reports.iter().map(|r| (r.kind, r.shape)).collect();
    assert_eq!(
        order,
        vec![
            (KernelKind::Reference, ConvShape::new(1, 9, 2, 3, 3, 1, 2)),
            (KernelKind::Reference, ConvShape::new(2, 6, 2, 3, 3, 0, 1)),
            (KernelKind::Candidate, ConvShape::new(2, 6, 2, 3, 3, 0, 1)),
        ]
    );

    for report in &summary.reports {
        assert_eq!(
            report.states,
            vec![
                RunState::Building,
                RunState::WarmingUp,
                RunState::Timing,
                RunState::Done
            ]
        );
        let results = report.results.as_ref().unwrap();
        assert_eq!(results.num_executions, 3);
        assert_eq!(results.flops_per_execution, report.shape.flops().unwrap());
    }
}

#[test]
fn test_run_single_kernel() {
    let runner = BenchmarkRunner::new(tiny_suite(false)).unwrap();
    let summary = runner.run_benchmark("reference").unwrap();
    assert_eq!(summary.num_timed(), 2);
    assert!(summary.reports.iter().all(|r| r.kind == KernelKind::Reference));
    assert_eq!(summary.results().len(), 2);
}
