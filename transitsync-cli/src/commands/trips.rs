//! Trips command - trips for a route selection.

use anyhow::Result;
use clap::Args;
use tracing::info;

use transitsync_core::TripFilters;
use transitsync_store::{Config, Pager, TripRepository};

use super::{collect_pages, print, Session};
use crate::Cli;

/// Arguments for the trips command.
#[derive(Args)]
pub struct TripsArgs {
    /// Route to list trips for (repeatable).
    #[arg(long, short)]
    pub route: Vec<String>,

    /// Trip name filter.
    #[arg(long, short)]
    pub name: Option<String>,

    /// Number of pages to load.
    #[arg(long, short, default_value = "1")]
    pub pages: usize,
}

/// Runs the trips command.
pub async fn run(args: &TripsArgs, cli: &Cli, config: &Config) -> Result<()> {
    let session = Session::new(config)?;
    let repository = TripRepository::new(session.api);

    let filters = TripFilters::new(&args.route, args.name.clone().unwrap_or_default());
    if filters.is_empty() {
        info!("No route or name given, nothing to list");
    }

    let pager = Pager::new(move |query| repository.pages(query));
    let mut rx = pager.subscribe();
    pager.submit(TripRepository::query_for(&filters));
    let snapshot = collect_pages(&mut rx, args.pages.max(1), || pager.load_next()).await?;

    if let Some(err) = snapshot.error() {
        anyhow::bail!("{err}");
    }

    print(cli, &snapshot.items, |f| f.format_trips(&snapshot.items))
}
