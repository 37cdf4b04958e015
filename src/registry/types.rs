//! Host and stack record types.

use std::fmt;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{RecordKind, RegistryError};

/// Default SSH port applied when a registration omits one.
pub const DEFAULT_SSH_PORT: u16 = 22;

const fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// How a host is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// The Docker Engine API at `endpoint_url`.
    #[serde(alias = "docker")]
    Api,
    /// Shell commands over SSH.
    Ssh,
}

impl ConnectionKind {
    /// The value stored in the `host.connection` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Ssh => "ssh",
        }
    }

    /// Parse a stored column value.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Storage` for values this build does not know.
    pub fn from_column(value: &str) -> Result<Self, RegistryError> {
        match value {
            "api" | "docker" => Ok(Self::Api),
            "ssh" => Ok(Self::Ssh),
            other => Err(RegistryError::Storage {
                message: format!("unknown connection kind '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration payload for a host.
///
/// Fields belonging to the other connection kind are stored but ignored.
/// Missing fields required by the declared kind surface when the host is
/// used, not here. Legacy field names (`connection_type`, `docker_url`,
/// `host`, `ssh_key_filename`) are accepted on input.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    /// Display label; not required to be unique.
    pub name: String,

    /// Which backend serves this host.
    #[serde(alias = "connection_type")]
    pub connection: ConnectionKind,

    /// Docker Engine endpoint, e.g. `tcp://10.0.0.5:2375`.
    #[serde(default, alias = "docker_url")]
    pub endpoint_url: Option<String>,

    /// SSH hostname or IP address.
    #[serde(default, alias = "host")]
    pub address: Option<String>,

    /// SSH login user.
    #[serde(default)]
    pub ssh_user: Option<String>,

    /// Private key path on the controller.
    #[serde(default, alias = "ssh_key_filename")]
    pub ssh_key_path: Option<String>,

    /// SSH port.
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Identity to run commands as via `sudo`.
    #[serde(default)]
    pub sudo_user: Option<String>,

    /// Password fed to `sudo`, if it asks for one.
    #[serde(default)]
    pub sudo_password: Option<String>,
}

impl fmt::Debug for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSpec")
            .field("name", &self.name)
            .field("connection", &self.connection)
            .field("endpoint_url", &self.endpoint_url)
            .field("address", &self.address)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_key_path", &self.ssh_key_path)
            .field("ssh_port", &self.ssh_port)
            .field("sudo_user", &self.sudo_user)
            .field(
                "sudo_password",
                &self.sudo_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl HostSpec {
    /// Check the fields that must hold regardless of connection kind.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidRecord` for a blank name or a zero port.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(invalid_host("name must not be empty"));
        }
        if self.ssh_port == 0 {
            return Err(invalid_host("ssh_port must be between 1 and 65535"));
        }
        Ok(())
    }
}

fn invalid_host(reason: &str) -> RegistryError {
    RegistryError::InvalidRecord {
        kind: RecordKind::Host,
        reason: String::from(reason),
    }
}

/// A stored host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Storage-assigned identifier.
    pub id: i64,

    /// The registered fields.
    #[serde(flatten)]
    pub spec: HostSpec,
}

impl Host {
    /// The host's connection kind.
    #[must_use]
    pub const fn connection(&self) -> ConnectionKind {
        self.spec.connection
    }
}

/// Registration payload for a Compose stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSpec {
    /// Display label.
    pub name: String,

    /// Absolute path of the Compose file on the target host.
    pub compose_file: String,
}

impl StackSpec {
    /// Check the stack name and Compose file path.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidRecord` for a blank name, or a Compose
    /// path that is relative or names no file.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(invalid_stack("name must not be empty"));
        }
        let path = Utf8Path::new(&self.compose_file);
        if !path.as_str().starts_with('/') {
            return Err(invalid_stack("compose_file must be an absolute path"));
        }
        if path.file_name().is_none() {
            return Err(invalid_stack("compose_file must name a file"));
        }
        Ok(())
    }
}

fn invalid_stack(reason: &str) -> RegistryError {
    RegistryError::InvalidRecord {
        kind: RecordKind::Stack,
        reason: String::from(reason),
    }
}

/// A stored stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Storage-assigned identifier.
    pub id: i64,

    /// The owning host.
    pub host_id: i64,

    /// The registered fields.
    #[serde(flatten)]
    pub spec: StackSpec,
}
