//! Engine behaviour against the deterministic mock backend.

use llmbench_engine::backend::mock::MockBackend;
use llmbench_engine::{
    BenchError, BenchmarkEngine, BenchmarkObserver, Device, ManualClock, Measurement, Metric,
    Precision, WorkloadProfile,
};
use std::time::Duration;

fn mock_engine(
    device: Device,
    matmul_cost: Duration,
) -> BenchmarkEngine<MockBackend, ManualClock> {
    let clock = ManualClock::new();
    let backend = MockBackend::new(device, clock.clone()).with_matmul_cost(matmul_cost);
    BenchmarkEngine::with_clock(backend, clock)
}

fn assert_close(got: f64, want: f64) {
    let tol = want.abs() * 1e-12;
    assert!((got - want).abs() <= tol, "got {got}, want {want}");
}

fn expected_gflops(size: usize, iterations: usize, elapsed_secs: f64) -> f64 {
    2.0 * (size as f64).powi(3) * iterations as f64 / (elapsed_secs * 1e9)
}

// ── float throughput ─────────────────────────────────────────────────────────

#[test]
fn float_throughput_matches_formula_for_injected_elapsed() {
    for precision in [Precision::Fp32, Precision::Fp16, Precision::Fp8Sim] {
        let engine = mock_engine(Device::Cpu, Duration::from_millis(25));
        let gflops = engine.run_matmul_benchmark(precision).unwrap();
        // warm-up is excluded: 10 timed iterations at 25ms each
        assert_close(gflops, expected_gflops(1024, 10, 0.25));
    }
}

#[test]
fn accelerator_throughput_uses_heavy_profile() {
    let engine = mock_engine(Device::Cuda(0), Duration::from_millis(4));
    let gflops = engine.run_matmul_benchmark(Precision::Fp32).unwrap();
    assert_close(gflops, expected_gflops(2048, 60, 0.24));
}

#[test]
fn synchronize_once_per_timed_iteration() {
    let engine = mock_engine(Device::Cuda(0), Duration::from_millis(1));
    engine.run_matmul_benchmark(Precision::Fp16).unwrap();
    let calls = engine.backend().calls();
    // one warm-up plus sixty timed multiplies, each followed by one barrier
    assert_eq!(calls.matmuls, 61);
    assert_eq!(calls.synchronizations, 61);
}

// ── integer paths ────────────────────────────────────────────────────────────

#[test]
fn integer_paths_return_zero_off_cpu() {
    for device in [Device::Cuda(0), Device::Metal(0)] {
        let engine = mock_engine(device, Duration::from_millis(1));
        for precision in [Precision::Int8Sim, Precision::Int4Sim] {
            assert_eq!(engine.run_matmul_benchmark(precision).unwrap(), 0.0);
        }
        assert_eq!(engine.backend().calls().matmuls, 0);
    }
}

#[test]
fn integer_paths_measure_on_cpu() {
    let engine = mock_engine(Device::Cpu, Duration::from_millis(50));
    let gops = engine.run_matmul_benchmark(Precision::Int8Sim).unwrap();
    assert_close(gops, expected_gflops(1024, 10, 0.5));
    let gops = engine.run_matmul_benchmark(Precision::Int4Sim).unwrap();
    assert_close(gops, expected_gflops(1024, 10, 0.5));
}

// ── memory bandwidth ─────────────────────────────────────────────────────────

fn memory_engine(bytes: u64, copy_cost: Duration) -> BenchmarkEngine<MockBackend, ManualClock> {
    let clock = ManualClock::new();
    let backend = MockBackend::new(Device::Cpu, clock.clone()).with_copy_cost(copy_cost);
    let profile = WorkloadProfile::new(16, 8, bytes).unwrap();
    BenchmarkEngine::with_profile(backend, profile, clock)
}

#[test]
fn bandwidth_is_gib_per_average_iteration() {
    // 1 GiB per copy at 0.5s per copy
    let engine = memory_engine(1 << 30, Duration::from_millis(500));
    assert_close(engine.run_memory_bandwidth_test().unwrap(), 2.0);
}

#[test]
fn bandwidth_invariant_under_proportional_scaling() {
    let base = memory_engine(8 << 20, Duration::from_micros(300));
    let doubled = memory_engine(16 << 20, Duration::from_micros(600));
    assert_close(
        doubled.run_memory_bandwidth_test().unwrap(),
        base.run_memory_bandwidth_test().unwrap(),
    );
}

#[test]
fn bandwidth_syncs_after_fill_and_every_copy() {
    let engine = memory_engine(4096, Duration::from_micros(10));
    engine.run_memory_bandwidth_test().unwrap();
    let calls = engine.backend().calls();
    assert_eq!(calls.copies, 8);
    assert_eq!(calls.synchronizations, 9);
}

// ── run_all ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Vec<(bool, Metric)>,
    skipped: Vec<Metric>,
}

impl BenchmarkObserver for Recorder {
    fn on_start(&mut self, metric: Metric) {
        self.events.push((true, metric));
    }

    fn on_finish(&mut self, metric: Metric, measurement: &Measurement) {
        self.events.push((false, metric));
        if measurement.is_skipped() {
            self.skipped.push(metric);
        }
    }
}

#[test]
fn run_all_visits_metrics_in_fixed_order() {
    let engine = mock_engine(Device::Cpu, Duration::from_millis(1));
    let mut recorder = Recorder::default();
    engine.run_all_benchmarks_with(&mut recorder).unwrap();

    let expected: Vec<(bool, Metric)> =
        Metric::ALL.iter().flat_map(|&m| [(true, m), (false, m)]).collect();
    assert_eq!(recorder.events, expected);
    assert!(recorder.skipped.is_empty());
}

#[test]
fn run_all_on_accelerator_records_skips() {
    let engine = mock_engine(Device::Metal(0), Duration::from_millis(1));
    let results = engine.run_all_benchmarks().unwrap();
    assert_eq!(results.int8, 0.0);
    assert_eq!(results.int4, 0.0);
    assert!(results.is_skipped(Metric::Int8));
    assert!(results.is_skipped(Metric::Int4));
    assert!(results.fp32 > 0.0 && results.fp16 > 0.0 && results.fp8 > 0.0);
    assert!(results.mem_bw > 0.0);
}

#[test]
fn run_all_builds_a_fresh_record_each_time() {
    let engine = mock_engine(Device::Cpu, Duration::from_millis(2));
    let first = engine.run_all_benchmarks().unwrap();
    let second = engine.run_all_benchmarks().unwrap();
    assert_eq!(first, second);
}

#[test]
fn runtime_failure_propagates_unmodified() {
    let clock = ManualClock::new();
    let backend = MockBackend::new(Device::Cpu, clock.clone()).failing_matmul_at(3);
    let engine = BenchmarkEngine::with_clock(backend, clock);
    let err = engine.run_all_benchmarks().unwrap_err();
    match err {
        BenchError::Runtime(e) => assert!(e.to_string().contains("matmul 3"), "{e}"),
        other => panic!("unexpected error: {other}"),
    }
    // no retry after the failure
    assert_eq!(engine.backend().calls().matmuls, 3);
}

#[test]
fn score_of_run_uses_reference_baseline() {
    let engine = mock_engine(Device::Cpu, Duration::from_millis(1));
    let results = engine.run_all_benchmarks().unwrap();
    let score = engine.compute_overall_score(&results);
    assert!(score.is_finite() && score > 0.0);
}
