//! Configuration system for dockhand.
//!
//! This module provides the configuration structures and CLI definitions for
//! the service. Layered merging is handled by the `ortho_config` crate: CLI
//! flags override environment variables, which override configuration files,
//! which override defaults.
//!
//! The configuration file is expected at `~/.config/dockhand/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! listen = "0.0.0.0:8080"
//! database = "/var/lib/dockhand/dockhand.db"
//!
//! [ssh]
//! connect_timeout_secs = 30
//! command_timeout_secs = 300
//!
//! [docker]
//! timeout_secs = 30
//!
//! [stacks]
//! serialize_operations = true
//!
//! [logging]
//! filter = "info,dockhand=debug"
//! format = "json"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands};
pub use loader::{env_var_names, load_config};
pub use types::{
    AppConfig, DEFAULT_DATABASE, DEFAULT_LISTEN, DockerConfig, LogFormat, LoggingConfig,
    SshConfig, StacksConfig,
};
