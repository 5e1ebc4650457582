// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! transitsync CLI - live transit vehicles from the command line.
//!
//! # Examples
//!
//! ```bash
//! # First page of every vehicle
//! transitsync
//!
//! # Vehicles on two routes, three pages
//! transitsync vehicles --route Red --route 39 --pages 3
//!
//! # One vehicle with its route, trip, stop and shape, refreshed every 5s
//! transitsync vehicle y1234 --watch
//!
//! # Route picker search
//! transitsync routes --search silver
//!
//! # Trips on a route matching a name
//! transitsync trips --route 39 --name 1234
//!
//! # JSON output
//! transitsync --format json --pretty vehicles
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, routes, trips, vehicle, vehicles, RateLimited};
use output::TextFormatter;

// ============================================================================
// CLI Definition
// ============================================================================

/// transitsync CLI - live transit vehicles.
#[derive(Parser)]
#[command(name = "transitsync")]
#[command(about = "Live transit vehicle CLI")]
#[command(long_about = r#"
transitsync lists live vehicles from a JSON:API transit feed, resolves a
vehicle's route, trip, stop and shape, and keeps it refreshed.

The API key is read from $MBTA_API_KEY (or the variable named by
api.api_key_env in the config file), then from api.api_key.

Examples:
  transitsync                           # First page of vehicles
  transitsync vehicles --route Red      # Vehicles on a route
  transitsync vehicle y1234 --watch     # Poll one vehicle
  transitsync routes --search line      # Search routes
  transitsync --format json trips -r 39 # Trips on a route as JSON
"#)]
#[command(version)]
#[command(author = "transitsync Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'vehicles' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Config file to use instead of the default.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List live vehicles (default if no command specified).
    #[command(visible_alias = "ls")]
    Vehicles(vehicles::VehiclesArgs),

    /// Show one vehicle with its relations.
    #[command(visible_alias = "v")]
    Vehicle(vehicle::VehicleArgs),

    /// List routes.
    #[command(visible_alias = "r")]
    Routes(routes::RoutesArgs),

    /// List trips for a route selection.
    #[command(visible_alias = "t")]
    Trips(trips::TripsArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Upstream rate limit hit.
    RateLimited = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("transitsync=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("transitsync={level},warn")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(ExitCode::Error as i32);
        }
    };

    setup_logging(cli.verbose, cli.quiet, &config.log_level);

    let result = match &cli.command {
        Some(Commands::Vehicles(args)) => vehicles::run(args, &cli, &config).await,
        Some(Commands::Vehicle(args)) => vehicle::run(args, &cli, &config).await,
        Some(Commands::Routes(args)) => routes::run(args, &cli, &config).await,
        Some(Commands::Trips(args)) => trips::run(args, &cli, &config).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &config).await,
        None => vehicles::run(&vehicles::VehiclesArgs::default(), &cli, &config).await,
    };

    if let Err(e) = result {
        let formatter = TextFormatter::new(!cli.no_color);
        let code = match e.downcast_ref::<RateLimited>() {
            Some(RateLimited(state)) => {
                if !cli.quiet {
                    eprintln!("{}", formatter.format_rate_limit(state));
                }
                ExitCode::RateLimited
            }
            None => {
                if !cli.quiet {
                    eprintln!("{}", formatter.format_error(&format!("{e:#}")));
                }
                ExitCode::Error
            }
        };
        std::process::exit(code as i32);
    }

    Ok(())
}
