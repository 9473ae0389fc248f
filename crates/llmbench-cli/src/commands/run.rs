//! Non-interactive benchmark run, also used by the interactive worker.

use anyhow::Result;
use llmbench_common::Device;
use llmbench_engine::{
    BenchmarkEngine, CandleBackend, ComputeBackend, ResultsRecord, SystemClock, WorkloadProfile,
};
use tracing::{error, info, warn};

use crate::config::CliConfig;
use crate::exit::{EXIT_DEVICE_FAIL, EXIT_SUCCESS};
use crate::output::{
    render_text_report, running_line, unavailable_line, DeviceOutcome, JsonReport, OutputFormat,
};
use crate::progress::ProgressObserver;

/// Settings for a sequence of device runs.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub format: OutputFormat,
    pub progress: bool,
    /// Overrides the per-device workload when set.
    pub profile: Option<WorkloadProfile>,
}

impl From<&CliConfig> for RunOptions {
    fn from(config: &CliConfig) -> Self {
        Self {
            format: config.format,
            progress: config.progress,
            profile: config.smoke.then_some(WorkloadProfile::SMOKE),
        }
    }
}

/// Devices named on the command line, or every device this host can use.
pub fn resolve_devices(config: &CliConfig) -> Vec<Device> {
    match &config.devices {
        Some(devices) => devices.clone(),
        None => {
            let found = llmbench_device_probe::available_devices();
            info!(
                "Auto-detected devices: {}",
                found.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );
            found
        }
    }
}

/// Run every benchmark on an opened backend with a fresh engine.
pub fn benchmark_device(
    backend: CandleBackend,
    options: &RunOptions,
) -> llmbench_common::Result<(ResultsRecord, f64)> {
    let device = backend.device();
    let engine = match options.profile {
        Some(profile) => BenchmarkEngine::with_profile(backend, profile, SystemClock::new()),
        None => BenchmarkEngine::new(backend),
    };
    let mut observer = ProgressObserver::new(device, options.progress);
    let results = engine.run_all_benchmarks_with(&mut observer)?;
    observer.finish();
    let score = engine.compute_overall_score(&results);
    Ok((results, score))
}

/// Benchmark `devices` one after another.
///
/// In text mode every status line and report block is handed to `sink` as
/// soon as it is ready. A device that cannot be opened or fails at runtime is
/// reported and the remaining devices still run.
pub fn run_devices(
    devices: &[Device],
    options: &RunOptions,
    sink: &mut dyn FnMut(String),
) -> Vec<DeviceOutcome> {
    let text = options.format == OutputFormat::Text;
    let mut outcomes = Vec::with_capacity(devices.len());

    for &device in devices {
        let backend = match CandleBackend::new(device) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("{e}");
                if text {
                    sink(unavailable_line(device));
                }
                outcomes.push(DeviceOutcome::Unavailable { device, reason: e.to_string() });
                continue;
            }
        };

        if text {
            sink(running_line(device));
        }
        let outcome = match benchmark_device(backend, options) {
            Ok((results, score)) => {
                if text {
                    sink(render_text_report(device, &results, score));
                }
                DeviceOutcome::Completed { device, results, score }
            }
            Err(e) => {
                error!("Benchmark on {device} failed: {e}");
                if text {
                    sink(format!("Error running benchmark on {device}: {e}"));
                }
                DeviceOutcome::Failed { device, error: e.to_string() }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Exit status for a finished run.
pub fn exit_code(outcomes: &[DeviceOutcome]) -> i32 {
    if outcomes.iter().any(DeviceOutcome::is_failed) {
        EXIT_DEVICE_FAIL
    } else {
        EXIT_SUCCESS
    }
}

/// `--cli`: benchmark every requested device and print the report.
pub fn execute(config: &CliConfig) -> Result<i32> {
    let devices = resolve_devices(config);
    let options = RunOptions::from(config);
    let outcomes = run_devices(&devices, &options, &mut |line| println!("{line}"));

    if config.format == OutputFormat::Json {
        let report = JsonReport::new(config, &outcomes);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(exit_code(&outcomes))
}
