//! Progress bar driven by engine callbacks.

use indicatif::{ProgressBar, ProgressStyle};
use llmbench_common::Device;
use llmbench_engine::{BenchmarkObserver, Measurement, Metric};
use std::time::Duration;

pub struct ProgressObserver {
    device: Device,
    bar: ProgressBar,
}

impl ProgressObserver {
    /// A visible bar on stderr, or a hidden one when `enabled` is false.
    pub fn new(device: Device, enabled: bool) -> Self {
        let len = Metric::ALL.len() as u64;
        if !enabled {
            return Self { device, bar: ProgressBar::hidden() };
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { device, bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BenchmarkObserver for ProgressObserver {
    fn on_start(&mut self, metric: Metric) {
        self.bar.set_message(format!("{} {}", self.device, metric));
    }

    fn on_finish(&mut self, _metric: Metric, _measurement: &Measurement) {
        self.bar.inc(1);
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_still_counts() {
        let mut observer = ProgressObserver::new(Device::Cpu, false);
        for metric in Metric::ALL {
            observer.on_start(metric);
            observer.on_finish(metric, &Measurement::Measured(1.0));
        }
        assert_eq!(observer.position(), Metric::ALL.len() as u64);
        observer.finish();
    }
}
