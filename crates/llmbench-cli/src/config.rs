//! Configuration assembled from command-line flags.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use llmbench_common::Device;
use serde::Serialize;

use crate::output::OutputFormat;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// How the front end is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Key-driven device picker on the terminal.
    Interactive,
    /// Run once and print the report.
    Cli,
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Compact }
    }
}

/// Validated front-end configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CliConfig {
    pub mode: RunMode,
    /// Explicit device list; `None` means every available device.
    pub devices: Option<Vec<Device>>,
    pub format: OutputFormat,
    pub progress: bool,
    /// Use the tiny smoke-test workload instead of the per-device one.
    pub smoke: bool,
    pub logging: LoggingConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Interactive,
            devices: None,
            format: OutputFormat::Text,
            progress: true,
            smoke: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Builder for [`CliConfig`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: CliConfig,
    device_names: Vec<String>,
    log_level: Option<String>,
    quiet: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cli_mode(mut self, cli: bool) -> Self {
        self.config.mode = if cli { RunMode::Cli } else { RunMode::Interactive };
        self
    }

    /// Device names such as `cpu`, `cuda:1` or `metal`.
    pub fn devices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.config.progress = progress;
        self
    }

    pub fn smoke(mut self, smoke: bool) -> Self {
        self.config.smoke = smoke;
        self
    }

    /// Parse and check every flag, producing the final configuration.
    pub fn build(self) -> Result<CliConfig> {
        let Self { mut config, device_names, log_level, quiet } = self;

        if !device_names.is_empty() {
            let mut devices = Vec::with_capacity(device_names.len());
            for name in &device_names {
                let device: Device =
                    name.trim().parse().with_context(|| format!("invalid --device '{name}'"))?;
                if !devices.contains(&device) {
                    devices.push(device);
                }
            }
            config.devices = Some(devices);
        }

        if let Some(level) = log_level {
            let level = level.to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                bail!("invalid log level '{level}'. Expected one of: {}", LOG_LEVELS.join(", "));
            }
            config.logging.level = level;
        } else if quiet {
            config.logging.level = "error".to_string();
        }

        if config.mode == RunMode::Interactive && config.format == OutputFormat::Json {
            bail!("--format json requires --cli");
        }

        // the progress bar would interleave with machine-readable output
        if quiet || config.format == OutputFormat::Json {
            config.progress = false;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_interactive_text() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn devices_are_parsed_and_deduplicated() {
        let config = ConfigBuilder::new()
            .cli_mode(true)
            .devices(["cpu", "cuda:1", "CPU", "metal"])
            .build()
            .unwrap();
        assert_eq!(
            config.devices,
            Some(vec![Device::Cpu, Device::Cuda(1), Device::Metal(0)])
        );
    }

    #[test]
    fn unknown_device_fails() {
        let err = ConfigBuilder::new().cli_mode(true).devices(["tpu"]).build().unwrap_err();
        assert!(format!("{err:#}").contains("unknown device kind 'tpu'"), "{err:#}");
    }

    #[test]
    fn json_disables_progress() {
        let config =
            ConfigBuilder::new().cli_mode(true).format(OutputFormat::Json).build().unwrap();
        assert!(!config.progress);
    }

    #[test]
    fn json_needs_cli_mode() {
        assert!(ConfigBuilder::new().format(OutputFormat::Json).build().is_err());
    }

    #[test]
    fn quiet_raises_level_unless_explicit() {
        let quiet = ConfigBuilder::new().quiet(true).build().unwrap();
        assert_eq!(quiet.logging.level, "error");
        assert!(!quiet.progress);

        let explicit =
            ConfigBuilder::new().quiet(true).log_level(Some("DEBUG".into())).build().unwrap();
        assert_eq!(explicit.logging.level, "debug");
    }

    #[test]
    fn smoke_is_off_unless_asked() {
        assert!(!ConfigBuilder::new().cli_mode(true).build().unwrap().smoke);
        assert!(ConfigBuilder::new().cli_mode(true).smoke(true).build().unwrap().smoke);
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(ConfigBuilder::new().log_level(Some("loud".into())).build().is_err());
    }
}
