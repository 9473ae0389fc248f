//! Weighted Benchmark Points score.
//!
//! ```text
//! score = Σ weight(m) · result(m) / baseline(m)
//! ```
//!
//! The weights sum to 100, so a device that hits every baseline exactly
//! scores 100. Skipped metrics are `0.0` and contribute nothing; they are not
//! dropped from the sum, so a device that skips a precision scores lower than
//! one that measured it. Compare scores across device kinds with that in mind.

use crate::results::{Metric, ResultsRecord};
use serde::Serialize;

/// Reference throughput per metric used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineTable {
    /// GB/s
    pub mem_bw: f64,
    /// GFLOPS
    pub fp32: f64,
    pub fp16: f64,
    pub fp8: f64,
    /// GOPS
    pub int8: f64,
    pub int4: f64,
}

impl BaselineTable {
    pub const REFERENCE: Self =
        Self { mem_bw: 50.0, fp32: 100.0, fp16: 200.0, fp8: 400.0, int8: 400.0, int4: 800.0 };

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Fp32 => self.fp32,
            Metric::Fp16 => self.fp16,
            Metric::Fp8 => self.fp8,
            Metric::Int8 => self.int8,
            Metric::Int4 => self.int4,
            Metric::MemBw => self.mem_bw,
        }
    }
}

impl Default for BaselineTable {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Share of the score carried by each metric.
pub const fn weight(metric: Metric) -> f64 {
    match metric {
        Metric::MemBw => 35.0,
        Metric::Fp32 => 5.0,
        Metric::Fp16 => 25.0,
        Metric::Fp8 => 10.0,
        Metric::Int8 => 10.0,
        Metric::Int4 => 15.0,
    }
}

/// Reduce a results record to Benchmark Points against `baseline`.
pub fn overall_score(results: &ResultsRecord, baseline: &BaselineTable) -> f64 {
    Metric::ALL.iter().map(|&m| weight(m) * (results.get(m) / baseline.get(m))).sum()
}
