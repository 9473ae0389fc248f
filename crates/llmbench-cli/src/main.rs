//! llmbench command-line interface
//!
//! Without `--cli` a key-driven device picker is shown; with it every
//! available (or `--device`-selected) device is benchmarked once and the
//! report is printed.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::ffi::OsString;
use std::io;

use llmbench_cli::commands::{devices, interactive, run};
use llmbench_cli::config::{CliConfig, ConfigBuilder, LogFormat, RunMode};
use llmbench_cli::exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS};
use llmbench_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "llmbench")]
#[command(about = "Compute and memory throughput benchmark for CPUs and GPUs")]
#[command(version)]
struct Cli {
    /// Run once without the device picker and print the report
    #[arg(long)]
    cli: bool,

    /// Devices to benchmark (cpu, cuda[:N], metal[:N]); defaults to all available
    #[arg(short, long, value_delimiter = ',', value_name = "DEVICE")]
    device: Vec<String>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output style
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Only print the report and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Run with tiny workload sizes to check a device works end to end
    #[arg(long, hide = true)]
    smoke: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which devices this build and host can benchmark
    Devices,
}

/// Accept the single-dash `-cli` spelling as `--cli`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter().map(|arg| if arg == "-cli" { OsString::from("--cli") } else { arg }).collect()
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    if let Some(shell) = cli.completions {
        generate_completions(shell);
        return;
    }

    let code = match run_cli(cli) {
        Ok(code) => code,
        Err(e) => {
            // logging may not be set up yet, so report directly
            eprintln!("Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {cause}");
            }
            EXIT_GENERIC_FAIL
        }
    };
    if code != EXIT_SUCCESS {
        std::process::exit(code);
    }
}

fn run_cli(cli: Cli) -> Result<i32> {
    let config = ConfigBuilder::new()
        // subcommands never open the device picker
        .cli_mode(cli.cli || cli.command.is_some())
        .devices(cli.device)
        .format(cli.format)
        .log_level(cli.log_level)
        .log_format(cli.log_format)
        .quiet(cli.quiet)
        .progress(!cli.no_progress)
        .smoke(cli.smoke)
        .build()?;

    setup_logging(&config);

    match cli.command {
        Some(Commands::Devices) => {
            devices::execute(config.format)?;
            Ok(EXIT_SUCCESS)
        }
        None => match config.mode {
            RunMode::Cli => run::execute(&config),
            RunMode::Interactive => interactive::execute(&config),
        },
    }
}

/// Install the tracing subscriber; logs go to stderr so reports stay clean.
fn setup_logging(config: &CliConfig) {
    let filter = tracing_subscriber::EnvFilter::new(&config.logging.level);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        LogFormat::Compact => {
            subscriber.compact().init();
        }
        LogFormat::Pretty => {
            subscriber.pretty().init();
        }
    }
}

/// Generate shell completions
fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
