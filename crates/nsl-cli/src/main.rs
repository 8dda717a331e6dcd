//! # nsl CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nsl_cli::config::{CliConfig, LogFormat, LOG_ENV_VAR};
use nsl_cli::replay::{run_inspect, run_replay, InspectArgs, ReplayArgs};

/// Namespace lifecycle toolchain.
///
/// Replays archive and deletion events against a namespace tree and
/// reports the resulting states and audit metadata.
#[derive(Parser, Debug)]
#[command(name = "nsl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log line format. Overrides the configuration file.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fire every step of a scenario and print the report.
    Replay(ReplayArgs),

    /// Print a namespace's own state, effective state and metadata.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    init_tracing(&config, cli.verbose, cli.log_format);
    tracing::debug!(?config, "nsl CLI starting");

    let result = match cli.command {
        Commands::Replay(args) => run_replay(&args, &config),
        Commands::Inspect(args) => run_inspect(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_tracing(config: &CliConfig, verbose: u8, format: Option<LogFormat>) {
    let directive = config.filter_directive(std::env::var(LOG_ENV_VAR).ok(), verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format.unwrap_or(config.log_format) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
