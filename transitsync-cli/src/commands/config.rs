//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use transitsync_store::{default_config_dir, Config};

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a config file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, config: &Config) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config),
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(cli, *force).await,
    }
}

fn config_path(cli: &Cli) -> std::path::PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}

fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    let key_source = if std::env::var(&config.api.api_key_env).is_ok_and(|k| !k.trim().is_empty()) {
        format!("${}", config.api.api_key_env)
    } else if config.api.api_key.is_some() {
        "config file".to_string()
    } else {
        "none".to_string()
    };

    match cli.format {
        OutputFormat::Text => {
            println!("transitsync Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Base URL:       {}", config.api.base_url);
            println!("API key:        {key_source}");
            println!("Timeout:        {}s", config.api.timeout_secs);
            println!("Poll interval:  {}ms", config.sync.poll_interval_ms);
            println!("Debounce:       {}ms", config.sync.debounce_ms);
            match config.sync.route_cache_ttl_secs {
                Some(ttl) => println!("Route cache:    {ttl}s"),
                None => println!("Route cache:    process lifetime"),
            }
            println!("Log level:      {}", config.log_level);
        }
        OutputFormat::Json => {
            let mut redacted = config.clone();
            redacted.api.api_key = redacted.api.api_key.map(|_| "***".to_string());
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&redacted)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = config_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli);

    if tokio::fs::try_exists(&path).await? && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save_to(&path).await?;
    info!(path = %path.display(), "Config initialized");
    println!("Wrote {}", path.display());

    Ok(())
}
