//! Command-line argument definitions for dockhand.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for dockhand.
#[derive(Debug, Parser)]
#[command(name = "dockhand")]
#[command(
    author,
    version,
    about = "REST controller for Docker hosts reached over the Engine API or SSH"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Socket address for the HTTP service.
    #[arg(long, global = true)]
    pub listen: Option<String>,

    /// Path to the `SQLite` registry database.
    #[arg(long, global = true)]
    pub database: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the REST API.
    Serve,

    /// Create any missing registry tables and exit.
    InitDb,
}
