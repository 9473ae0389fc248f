//! Progress notifications between sub-benchmarks.

use crate::results::{Measurement, Metric};

/// Receives a callback before and after each of the six sub-benchmarks.
///
/// Callbacks run on the engine's thread between timed loops, never inside
/// one, so a slow observer cannot skew a measurement.
pub trait BenchmarkObserver {
    fn on_start(&mut self, _metric: Metric) {}

    fn on_finish(&mut self, _metric: Metric, _measurement: &Measurement) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BenchmarkObserver for NoopObserver {}
