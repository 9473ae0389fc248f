//! Results of one benchmark run.

use serde::Serialize;
use std::fmt;

/// One of the six scored measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Fp32,
    Fp16,
    Fp8,
    Int8,
    Int4,
    MemBw,
}

impl Metric {
    /// Run order: the five matmul precisions, then memory bandwidth.
    pub const ALL: [Metric; 6] =
        [Metric::Fp32, Metric::Fp16, Metric::Fp8, Metric::Int8, Metric::Int4, Metric::MemBw];

    pub const fn key(self) -> &'static str {
        match self {
            Metric::Fp32 => "fp32",
            Metric::Fp16 => "fp16",
            Metric::Fp8 => "fp8",
            Metric::Int8 => "int8",
            Metric::Int4 => "int4",
            Metric::MemBw => "mem_bw",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Metric::Fp32 | Metric::Fp16 | Metric::Fp8 => "GFLOPS",
            Metric::Int8 | Metric::Int4 => "GOPS",
            Metric::MemBw => "GB/s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Outcome of a single sub-benchmark.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Measured(f64),
    Skipped { reason: String },
}

impl Measurement {
    /// The recorded value; skipped measurements record `0.0`.
    pub fn value(&self) -> f64 {
        match self {
            Measurement::Measured(v) => *v,
            Measurement::Skipped { .. } => 0.0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Measurement::Skipped { .. })
    }
}

/// Why a metric was not measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipNotice {
    pub metric: Metric,
    pub reason: String,
}

/// Throughput figures for one device.
///
/// Matmul fields are GFLOPS (float) or GOPS (integer); `mem_bw` is GB/s.
/// A skipped metric holds `0.0` and has a matching entry in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsRecord {
    pub fp32: f64,
    pub fp16: f64,
    pub fp8: f64,
    pub int8: f64,
    pub int4: f64,
    pub mem_bw: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipNotice>,
}

impl ResultsRecord {
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

    fn slot(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Fp32 => &mut self.fp32,
            Metric::Fp16 => &mut self.fp16,
            Metric::Fp8 => &mut self.fp8,
            Metric::Int8 => &mut self.int8,
            Metric::Int4 => &mut self.int4,
            Metric::MemBw => &mut self.mem_bw,
        }
    }

    /// Record a measurement, keeping the skip reason if there is one.
    pub fn record(&mut self, metric: Metric, measurement: Measurement) {
        *self.slot(metric) = measurement.value();
        self.skipped.retain(|s| s.metric != metric);
        if let Measurement::Skipped { reason } = measurement {
            self.skipped.push(SkipNotice { metric, reason });
        }
    }

    pub fn is_skipped(&self, metric: Metric) -> bool {
        self.skipped.iter().any(|s| s.metric == metric)
    }
}
