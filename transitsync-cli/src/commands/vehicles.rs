//! Vehicles command - list live vehicles.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use transitsync_core::VehicleFilters;
use transitsync_store::{Config, RateLimitMonitor, VehicleListController, VehicleRepository};

use super::{collect_pages, print, RateLimited, Session};
use crate::output::VehicleListOutput;
use crate::Cli;

/// Arguments for the vehicles command.
#[derive(Args, Default)]
pub struct VehiclesArgs {
    /// Only vehicles on this route (repeatable).
    #[arg(long, short)]
    pub route: Vec<String>,

    /// Only vehicles on this trip (repeatable).
    #[arg(long, short)]
    pub trip: Vec<String>,

    /// Number of pages to load.
    #[arg(long, short, default_value = "1")]
    pub pages: usize,
}

/// Runs the vehicles command.
pub async fn run(args: &VehiclesArgs, cli: &Cli, config: &Config) -> Result<()> {
    let session = Session::new(config)?;
    let monitor = Arc::new(RateLimitMonitor::new());
    let controller = VehicleListController::new(VehicleRepository::new(session.api), monitor);

    let filters = VehicleFilters::new(&args.route, &args.trip);
    info!(pages = args.pages, "Listing vehicles");

    let mut rx = controller.subscribe();
    controller.apply_filters(&filters);
    let snapshot = collect_pages(&mut rx, args.pages.max(1), || controller.load_next()).await?;

    if let Some(err) = snapshot.error() {
        if let Some(state) = controller.rate_limit().borrow().clone() {
            return Err(RateLimited(state).into());
        }
        anyhow::bail!("{err}");
    }

    let output = VehicleListOutput::new(&filters, &snapshot.items, !snapshot.append.is_end_of_data());
    print(cli, &output, |f| f.format_vehicles(&output))
}
