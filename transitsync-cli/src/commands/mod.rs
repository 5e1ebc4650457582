//! CLI command implementations.

pub mod config;
pub mod routes;
pub mod trips;
pub mod vehicle;
pub mod vehicles;

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::debug;

use transitsync_core::RateLimitState;
use transitsync_fetch::{ApiClient, TransitApi};
use transitsync_store::{Config, PagerSnapshot, RouteRepository};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Returned when a command stops on an upstream rate limit.
#[derive(Debug)]
pub struct RateLimited(pub RateLimitState);

impl fmt::Display for RateLimited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.message)
    }
}

impl std::error::Error for RateLimited {}

/// Loads the config file named on the command line, or the default one.
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    Config::load_from(&path)
        .await
        .with_context(|| format!("loading {}", path.display()))
}

/// Upstream client and shared route cache for one invocation.
pub struct Session {
    pub api: Arc<dyn TransitApi>,
    pub routes: Arc<RouteRepository>,
}

impl Session {
    /// Builds the HTTP client from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.client_settings();
        debug!(?settings, "Creating API client");
        if !settings.has_api_key() {
            debug!("No API key configured, using anonymous rate limits");
        }

        let api: Arc<dyn TransitApi> = Arc::new(ApiClient::new(&settings)?);
        let routes = Arc::new(RouteRepository::with_policy(
            Arc::clone(&api),
            config.cache_policy(),
            Arc::new(transitsync_core::SystemClock),
        ));
        Ok(Self { api, routes })
    }
}

/// Waits until no load is in flight and returns that snapshot.
pub async fn settled<T: Clone>(
    rx: &mut watch::Receiver<PagerSnapshot<T>>,
) -> Result<PagerSnapshot<T>> {
    let snapshot = rx
        .wait_for(|s| !s.is_loading())
        .await
        .context("pager closed")?;
    Ok(snapshot.clone())
}

/// Loads pages through `load_next` until `pages` are loaded, the data ends
/// or a load fails.
pub async fn collect_pages<T: Clone>(
    rx: &mut watch::Receiver<PagerSnapshot<T>>,
    pages: usize,
    load_next: impl Fn(),
) -> Result<PagerSnapshot<T>> {
    let mut snapshot = settled(rx).await?;
    for _ in 1..pages {
        if snapshot.error().is_some() || snapshot.append.is_end_of_data() {
            break;
        }
        load_next();
        snapshot = settled(rx).await?;
    }
    Ok(snapshot)
}

/// Prints `value` in the selected format.
pub fn print<T: serde::Serialize>(
    cli: &Cli,
    value: &T,
    text: impl FnOnce(&TextFormatter) -> String,
) -> Result<()> {
    match cli.format {
        OutputFormat::Text => println!("{}", text(&TextFormatter::new(!cli.no_color))),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(value)?),
    }
    Ok(())
}
