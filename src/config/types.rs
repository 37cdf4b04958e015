//! Configuration data types for dockhand.

use clap::ValueEnum;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Default `SQLite` database file.
pub const DEFAULT_DATABASE: &str = "dockhand.db";

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// SSH execution settings.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct SshConfig {
    /// Seconds allowed for TCP connect, handshake and authentication.
    #[default(30)]
    pub connect_timeout_secs: u64,

    /// Seconds allowed for a remote command to finish.
    #[default(300)]
    pub command_timeout_secs: u64,

    /// Known-hosts file used to verify server keys. `~/.ssh/known_hosts`
    /// when unset.
    pub known_hosts_path: Option<String>,
}

/// Docker Engine API settings.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Seconds allowed for a single Engine API call.
    #[default(30)]
    pub timeout_secs: u64,
}

/// Compose stack settings.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct StacksConfig {
    /// Serialise Compose verbs issued against the same stack.
    ///
    /// Turning this off reproduces unguarded concurrent `up`/`down` calls and
    /// is only meant for compatibility testing.
    #[default(true)]
    pub serialize_operations: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[default = "info"]
    pub filter: String,

    /// Event output format.
    pub format: LogFormat,
}

/// Root application configuration.
///
/// The precedence order (lowest to highest) is: defaults, configuration file,
/// environment variables, command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `DOCKHAND_CONFIG_PATH` environment variable
/// 2. `.dockhand.toml` in the current working directory
/// 3. `.dockhand.toml` in the home directory
/// 4. `~/.config/dockhand/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DOCKHAND",
    post_merge_hook,
    discovery(
        app_name = "dockhand",
        env_var = "DOCKHAND_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".dockhand.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Socket address the HTTP service listens on.
    pub listen: Option<String>,

    /// Path to the `SQLite` registry database.
    pub database: Option<String>,

    /// SSH execution settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub ssh: SshConfig,

    /// Docker Engine API settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub docker: DockerConfig,

    /// Compose stack settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub stacks: StacksConfig,

    /// Logging settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// The effective listen address.
    #[must_use]
    pub fn listen_addr(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }

    /// The effective database path.
    #[must_use]
    pub fn database_path(&self) -> &str {
        self.database.as_deref().unwrap_or(DEFAULT_DATABASE)
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Blank strings from the environment mean "use the default".
        self.listen = self.listen.take().filter(|value| !value.trim().is_empty());
        self.database = self
            .database
            .take()
            .filter(|value| !value.trim().is_empty());
        Ok(())
    }
}
