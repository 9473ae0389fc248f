//! Report rendering for benchmark runs.
//!
//! - `--format text` prints one block per device as it completes
//! - `--format json` emits a single document on stdout after every device ran

use clap::ValueEnum;
use llmbench_common::Device;
use llmbench_engine::{Metric, ResultsRecord};
use serde::Serialize;
use std::fmt::Write as _;

use crate::config::CliConfig;

/// Width of the rule printed after each device block.
pub const SEPARATOR_WIDTH: usize = 60;

/// Output format for benchmark reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// What happened when a device was benchmarked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeviceOutcome {
    Completed { device: Device, results: ResultsRecord, score: f64 },
    Unavailable { device: Device, reason: String },
    Failed { device: Device, error: String },
}

impl DeviceOutcome {
    pub fn device(&self) -> Device {
        match self {
            Self::Completed { device, .. }
            | Self::Unavailable { device, .. }
            | Self::Failed { device, .. } => *device,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub config: &'a CliConfig,
    pub devices: &'a [DeviceOutcome],
}

impl<'a> JsonReport<'a> {
    pub fn new(config: &'a CliConfig, devices: &'a [DeviceOutcome]) -> Self {
        Self { version: env!("CARGO_PKG_VERSION"), config, devices }
    }
}

fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Fp32 => "FP32 Performance",
        Metric::Fp16 => "FP16 Performance",
        Metric::Fp8 => "FP8 (simulated) Performance",
        Metric::Int8 => "INT8 (simulated) Performance",
        Metric::Int4 => "INT4 (simulated) Performance",
        Metric::MemBw => "Memory Bandwidth",
    }
}

/// Header line printed before a device starts.
pub fn running_line(device: Device) -> String {
    format!("Running benchmark on {device}...")
}

/// Line printed when a requested device cannot be used.
pub fn unavailable_line(device: Device) -> String {
    format!("{} is not available! Skipping.", device.kind().label())
}

/// Results block for one device, ending with the separator rule.
///
/// Values use two decimals. A metric the device could not run still prints
/// its `0.00` value, followed by a `(skipped)` marker.
pub fn render_text_report(device: Device, results: &ResultsRecord, score: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for {device}:");
    for metric in Metric::ALL {
        let _ = write!(
            out,
            "  {}: {:.2} {}",
            metric_label(metric),
            results.get(metric),
            metric.unit()
        );
        if results.is_skipped(metric) {
            out.push_str(" (skipped)");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "  Overall Score: {score:.2} Benchmark Points (BP)");
    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out
}
