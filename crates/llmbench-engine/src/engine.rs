//! Per-device benchmark execution.

use crate::backend::ComputeBackend;
use crate::clock::{Clock, SystemClock};
use crate::observer::{BenchmarkObserver, NoopObserver};
use crate::precision::{FloatFormat, MatmulPath, Precision};
use crate::results::{Measurement, Metric, ResultsRecord};
use crate::score::{overall_score, BaselineTable};
use crate::workload::{derive_profile, WorkloadProfile};
use llmbench_common::{BenchError, Device, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Runs the matmul and memory benchmarks for one device.
///
/// The engine holds no mutable state: every benchmark allocates its own data
/// and reads the profile fixed at construction. Calls block until the device
/// has finished all issued work.
pub struct BenchmarkEngine<B, C = SystemClock> {
    backend: B,
    profile: WorkloadProfile,
    clock: C,
}

impl<B: ComputeBackend> BenchmarkEngine<B> {
    /// Engine with the profile derived from the backend's device kind.
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock::new())
    }
}

impl<B: ComputeBackend, C: Clock> BenchmarkEngine<B, C> {
    pub fn with_clock(backend: B, clock: C) -> Self {
        let profile = derive_profile(backend.device().kind());
        Self::with_profile(backend, profile, clock)
    }

    /// Engine with an explicit profile. Scores from a non-derived profile are
    /// not comparable with scores from other devices.
    pub fn with_profile(backend: B, profile: WorkloadProfile, clock: C) -> Self {
        Self { backend, profile, clock }
    }

    pub fn profile(&self) -> &WorkloadProfile {
        &self.profile
    }

    pub fn device(&self) -> Device {
        self.backend.device()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Throughput of `precision` in GFLOPS/GOPS, or `0.0` when the device
    /// does not support it.
    pub fn run_matmul_benchmark(&self, precision: Precision) -> Result<f64> {
        Ok(self.measure_matmul(precision)?.value())
    }

    /// Like [`run_matmul_benchmark`](Self::run_matmul_benchmark) but keeps the
    /// skip reason.
    pub fn measure_matmul(&self, precision: Precision) -> Result<Measurement> {
        let device = self.device();
        if !precision.is_supported_on(device.kind()) {
            let reason = format!(
                "non-float matrix multiplication is not supported on {}",
                device.kind()
            );
            warn!("Skipping {precision} test on {device} as {reason}.");
            return Ok(Measurement::Skipped { reason });
        }

        let size = self.profile.matrix_dimension();
        debug!("Running {precision} matmul benchmark on {device} (size={size})");
        let (a, b) = match precision.path() {
            MatmulPath::Native(format) => (
                self.backend.random_matrix(size, format)?,
                self.backend.random_matrix(size, format)?,
            ),
            MatmulPath::QuantizedFloat => {
                let a = self.backend.random_matrix(size, FloatFormat::F32)?;
                let b = self.backend.random_matrix(size, FloatFormat::F32)?;
                (self.backend.quantize_fp8(&a)?, self.backend.quantize_fp8(&b)?)
            }
            MatmulPath::WidenedInt(range) => (
                self.backend.random_int_matrix(size, range)?,
                self.backend.random_int_matrix(size, range)?,
            ),
        };

        // warm-up absorbs lazy initialization and kernel compilation
        let warm = self.backend.matmul(&a, &b)?;
        self.backend.synchronize(&warm)?;

        let elapsed = self.time_iterations(|| self.backend.matmul(&a, &b))?;
        let secs = nonzero_seconds(elapsed, precision.metric())?;
        let iterations = self.profile.iteration_count() as f64;
        let throughput = self.profile.matmul_ops() * iterations / (secs * 1e9);
        info!(
            "{precision} on {device}: {throughput:.2} {} ({:.3}s for {} iterations)",
            precision.metric().unit(),
            secs,
            self.profile.iteration_count()
        );
        Ok(Measurement::Measured(throughput))
    }

    /// Copy bandwidth in GB/s (GiB-based).
    pub fn run_memory_bandwidth_test(&self) -> Result<f64> {
        let device = self.device();
        let elements = self.profile.memory_test_elements();
        debug!("Running memory bandwidth test on {device} ({elements} f32 elements)");

        let source = self.backend.random_buffer(elements)?;
        self.backend.synchronize(&source)?;

        let elapsed = self.time_iterations(|| self.backend.copy(&source))?;
        let secs = nonzero_seconds(elapsed, Metric::MemBw)?;
        let per_iteration = secs / self.profile.iteration_count() as f64;
        let gib = (elements * std::mem::size_of::<f32>()) as f64 / BYTES_PER_GIB;
        let bandwidth = gib / per_iteration;
        info!("Memory bandwidth on {device}: {bandwidth:.2} GB/s");
        Ok(bandwidth)
    }

    /// Run every benchmark in fixed order and collect the results.
    pub fn run_all_benchmarks(&self) -> Result<ResultsRecord> {
        self.run_all_benchmarks_with(&mut NoopObserver)
    }

    /// [`run_all_benchmarks`](Self::run_all_benchmarks) with progress callbacks.
    pub fn run_all_benchmarks_with(
        &self,
        observer: &mut dyn BenchmarkObserver,
    ) -> Result<ResultsRecord> {
        info!("Running benchmark on {}...", self.device());
        let mut results = ResultsRecord::default();
        for precision in Precision::ALL {
            let metric = precision.metric();
            observer.on_start(metric);
            let measurement = self.measure_matmul(precision)?;
            observer.on_finish(metric, &measurement);
            results.record(metric, measurement);
        }

        observer.on_start(Metric::MemBw);
        let measurement = Measurement::Measured(self.run_memory_bandwidth_test()?);
        observer.on_finish(Metric::MemBw, &measurement);
        results.record(Metric::MemBw, measurement);
        Ok(results)
    }

    /// Benchmark Points against [`BaselineTable::REFERENCE`].
    pub fn compute_overall_score(&self, results: &ResultsRecord) -> f64 {
        overall_score(results, &BaselineTable::REFERENCE)
    }

    /// Run `op` once per iteration, synchronizing on each result, and return
    /// the wall-clock span of the whole loop.
    fn time_iterations<F>(&self, mut op: F) -> Result<Duration>
    where
        F: FnMut() -> Result<B::Tensor>,
    {
        let start = self.clock.now();
        for _ in 0..self.profile.iteration_count() {
            let out = op()?;
            self.backend.synchronize(&out)?;
        }
        Ok(self.clock.now().saturating_sub(start))
    }
}

fn nonzero_seconds(elapsed: Duration, metric: Metric) -> Result<f64> {
    if elapsed.is_zero() {
        return Err(BenchError::ZeroElapsed(metric.to_string()));
    }
    Ok(elapsed.as_secs_f64())
}
