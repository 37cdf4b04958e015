//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use ortho_config::MergeComposer;
use rstest::fixture;
use serde_json::json;

use crate::config::{AppConfig, DEFAULT_DATABASE, DEFAULT_LISTEN, LogFormat};

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        listen = "0.0.0.0:9090"
        database = "/var/lib/dockhand/registry.db"

        [ssh]
        connect_timeout_secs = 5
        command_timeout_secs = 45
        known_hosts_path = "/etc/dockhand/known_hosts"

        [docker]
        timeout_secs = 12

        [stacks]
        serialize_operations = false

        [logging]
        filter = "debug"
        format = "json"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        [ssh]
        command_timeout_secs = 600
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Creates a composer with defaults, file and environment layers.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "listen": "0.0.0.0:7000",
            "database": "file.db",
            "ssh": { "command_timeout_secs": 90 }
        }),
        None,
    );

    composer.push_environment(json!({
        "listen": "0.0.0.0:7100"
    }));

    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.listen.is_none(), "listen should be None");
    assert!(config.database.is_none(), "database should be None");
    assert_eq!(config.listen_addr(), DEFAULT_LISTEN);
    assert_eq!(config.database_path(), DEFAULT_DATABASE);
    assert_eq!(config.ssh.connect_timeout_secs, 30);
    assert_eq!(config.ssh.command_timeout_secs, 300);
    assert!(config.ssh.known_hosts_path.is_none());
    assert_eq!(config.docker.timeout_secs, 30);
    assert!(
        config.stacks.serialize_operations,
        "stacks.serialize_operations should be true"
    );
    assert_eq!(config.logging.filter, "info");
    assert_eq!(config.logging.format, LogFormat::Compact);
}
