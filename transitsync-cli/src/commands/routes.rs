//! Routes command - list and search routes.

use anyhow::Result;
use clap::Args;

use transitsync_store::{Config, FilterController, TripRepository};

use super::{print, Session};
use crate::Cli;

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// Case-insensitive search over route names and ids.
    #[arg(long, short)]
    pub search: Option<String>,
}

/// Runs the routes command.
pub async fn run(args: &RoutesArgs, cli: &Cli, config: &Config) -> Result<()> {
    let session = Session::new(config)?;
    let filters = FilterController::new(
        session.routes,
        TripRepository::new(session.api),
        config.debounce(),
    );
    if let Some(search) = &args.search {
        filters.set_route_query(search.as_str());
    }

    let mut rx = filters.subscribe_routes();
    let picker = rx.wait_for(|p| !p.is_loading).await?.clone();
    if let Some(error) = picker.error {
        anyhow::bail!(error);
    }

    let routes = filters.visible_routes();
    print(cli, &routes, |f| f.format_routes(&routes))
}
