//! Vehicle command - one vehicle with its route, trip, stop and shape.

use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use transitsync_store::{Config, DetailState, RelationResolver, VehicleDetailController};

use super::{print, Session};
use crate::output::DetailOutput;
use crate::{Cli, OutputFormat};

/// Arguments for the vehicle command.
#[derive(Args)]
pub struct VehicleArgs {
    /// Vehicle id.
    pub id: String,

    /// Keep polling and reprint on every change.
    #[arg(long, short)]
    pub watch: bool,

    /// Polling interval in seconds (defaults to the configured interval).
    #[arg(long, short)]
    pub interval: Option<u64>,
}

/// Runs the vehicle command.
pub async fn run(args: &VehicleArgs, cli: &Cli, config: &Config) -> Result<()> {
    let session = Session::new(config)?;
    let resolver = Arc::new(RelationResolver::new(session.api, session.routes));

    if !args.watch {
        let detail = resolver.resolve(&args.id).await?;
        let output = DetailOutput::from(&detail);
        return print(cli, &output, |f| f.format_detail(&detail));
    }

    let interval = args
        .interval
        .map_or_else(|| config.poll_interval(), Duration::from_secs);
    info!(vehicle_id = %args.id, interval_secs = interval.as_secs(), "Watching vehicle");

    let controller = VehicleDetailController::new(resolver, args.id.clone(), interval);
    let mut rx = controller.subscribe();
    controller.start();

    loop {
        let state = rx.borrow_and_update().clone();
        match &state {
            DetailState::Loading => {}
            DetailState::Loaded(detail) => {
                if cli.format == OutputFormat::Text {
                    print!("\x1b[2J\x1b[H");
                    stdout().flush()?;
                }
                let output = DetailOutput::from(detail.as_ref());
                print(cli, &output, |f| f.format_detail(detail))?;
            }
            DetailState::Error { message, .. } => anyhow::bail!("{message}"),
            DetailState::Empty => anyhow::bail!("Vehicle {} not found", args.id),
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                break;
            }
        }
    }

    Ok(())
}
