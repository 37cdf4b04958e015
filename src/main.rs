//! `dockhand` application entry point.
//!
//! It uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/dockhand/config.toml` or path from `DOCKHAND_CONFIG_PATH`)
//! 3. Environment variables (`DOCKHAND_*`)
//! 4. Command-line arguments

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use dockhand::backend::{BollardConnector, RusshShell};
use dockhand::config::{AppConfig, Cli, Commands, load_config};
use dockhand::dispatch::{Dispatcher, Timeouts};
use dockhand::error::DockhandError;
use dockhand::registry::Registry;
use dockhand::server::{self, AppState};
use dockhand::telemetry;
use eyre::{Report, Result as EyreResult, WrapErr};
use mockable::DefaultEnv;
use tracing::info;

/// Application entry point.
///
/// Loads configuration, installs logging, then hands the chosen subcommand to
/// a multi-threaded Tokio runtime.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();

    // Load configuration with layered precedence: defaults < file < env < CLI.
    let config = load_config(&cli).map_err(Report::from)?;

    telemetry::initialise(&config.logging).wrap_err("failed to initialise logging")?;

    let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start the async runtime")?;
    runtime.block_on(run(&cli, &config)).map_err(Report::from)
}

/// Execute the CLI command, returning domain-specific errors.
///
/// The registry is opened before and closed after every command.
async fn run(cli: &Cli, config: &AppConfig) -> Result<(), DockhandError> {
    let registry = Registry::open(config.database_path()).await?;
    info!(database = config.database_path(), "registry ready");

    let outcome = match cli.command {
        Commands::Serve => serve(config, registry.clone()).await,
        Commands::InitDb => Ok(()),
    };

    registry.close().await;
    outcome
}

async fn serve(config: &AppConfig, registry: Registry) -> Result<(), DockhandError> {
    let shell = RusshShell::new(
        Duration::from_secs(config.ssh.connect_timeout_secs),
        config.ssh.known_hosts_path.as_deref().map(Utf8PathBuf::from),
    );
    let connector = BollardConnector::new(config.docker.timeout_secs);
    let dispatcher = Dispatcher::new(
        Arc::new(shell),
        Arc::new(connector),
        DefaultEnv::new(),
        Timeouts::from_config(&config.ssh, &config.docker),
    );
    let state = AppState::new(registry, dispatcher, config.stacks.serialize_operations);

    server::serve(config.listen_addr(), state, server::shutdown_signal()).await?;
    Ok(())
}
