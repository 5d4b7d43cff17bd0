//! # wps CLI entry point
//!
//! Parses command-line arguments, initializes tracing and dispatches to the
//! subcommand handlers in the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use wps_cli::check::run_check_config;
use wps_cli::prune::{run_prune, PruneArgs};
use wps_cli::resolve::{run_resolve, ResolveArgs};
use wps_cli::serve::{run_serve, ServeArgs};

/// WebP server
///
/// Serves WebP renditions of JPEG and PNG images, transcoding each image on
/// first request and caching the result on disk.
#[derive(Parser, Debug)]
#[command(name = "wps", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),

    /// Load and validate the configuration, then print the resolved values.
    CheckConfig,

    /// Show how a request path maps onto the image and cache directories.
    Resolve(ResolveArgs),

    /// Delete cached artifacts whose source image no longer exists.
    Prune(PruneArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args, &cli.config),
        Commands::CheckConfig => run_check_config(&cli.config),
        Commands::Resolve(args) => run_resolve(args, &cli.config),
        Commands::Prune(args) => run_prune(args, &cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
fn init_tracing(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
