//! Mapping from a host record to a backend descriptor.
//!
//! Resolution is pure apart from reading `HOME` for `~/` key paths: nothing is
//! cached and no network I/O happens here. Connections are opened by the
//! collaborators at dispatch time.

use std::fmt;

use crate::error::DispatchError;
use crate::registry::{ConnectionKind, Host};

/// Where the Docker Engine API of a host lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    /// Engine endpoint as registered, e.g. `tcp://10.0.0.5:2375`.
    pub endpoint: String,
}

/// The identity commands run as after SSH login.
#[derive(Clone, PartialEq, Eq)]
pub struct SudoIdentity {
    /// Target user passed to `sudo -u`.
    pub user: String,
    /// Password written to `sudo`'s stdin, if any.
    pub password: Option<String>,
}

impl fmt::Debug for SudoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SudoIdentity")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How to reach a host over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Hostname or IP address.
    pub address: String,
    /// TCP port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Private key path on the controller, with `~/` already expanded.
    pub key_path: String,
    /// Optional identity switch via `sudo`.
    pub sudo: Option<SudoIdentity>,
}

/// The backend a host is served by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Talk to the Docker Engine API.
    Api(ApiTarget),
    /// Run shell commands over SSH.
    Ssh(SshTarget),
}

/// Resolve a host record into a backend descriptor.
///
/// Fields belonging to the other connection kind are ignored. A blank value
/// counts as missing.
///
/// # Errors
///
/// Returns `DispatchError::Configuration` naming the first missing field:
/// `endpoint_url` for API hosts; `address`, `ssh_user` or `ssh_key_path` for
/// SSH hosts. A `~/` key path with `HOME` unset and an `https://` endpoint
/// are also configuration errors.
pub fn resolve<E: mockable::Env>(host: &Host, env: &E) -> Result<Backend, DispatchError> {
    let spec = &host.spec;
    match spec.connection {
        ConnectionKind::Api => {
            let endpoint = required(spec.endpoint_url.as_deref(), "endpoint_url")?;
            reject_tls(&endpoint)?;
            Ok(Backend::Api(ApiTarget { endpoint }))
        }
        ConnectionKind::Ssh => {
            let address = required(spec.address.as_deref(), "address")?;
            let user = required(spec.ssh_user.as_deref(), "ssh_user")?;
            let key_path =
                expand_home(&required(spec.ssh_key_path.as_deref(), "ssh_key_path")?, env)?;

            let sudo = present(spec.sudo_user.as_deref()).map(|sudo_user| SudoIdentity {
                user: sudo_user,
                password: spec.sudo_password.clone(),
            });

            Ok(Backend::Ssh(SshTarget {
                address,
                port: spec.ssh_port,
                user,
                key_path,
                sudo,
            }))
        }
    }
}

/// The error for an `https://` endpoint. Hosts carry no client
/// certificates, so a TLS-protected engine cannot be reached.
pub(crate) fn tls_unsupported() -> DispatchError {
    DispatchError::Configuration {
        field: "endpoint_url",
        reason: String::from("https:// endpoints are not supported; use tcp:// or http://"),
    }
}

fn reject_tls(endpoint: &str) -> Result<(), DispatchError> {
    if endpoint.starts_with("https://") {
        return Err(tls_unsupported());
    }
    Ok(())
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(String::from)
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, DispatchError> {
    present(value).ok_or_else(|| DispatchError::missing(field))
}

fn expand_home<E: mockable::Env>(path: &str, env: &E) -> Result<String, DispatchError> {
    let Some(rest) = path.strip_prefix("~/") else {
        return Ok(String::from(path));
    };

    let home = env
        .string("HOME")
        .filter(|home| !home.is_empty())
        .ok_or_else(|| DispatchError::Configuration {
            field: "ssh_key_path",
            reason: String::from("starts with ~/ but HOME is not set"),
        })?;

    Ok(format!("{}/{rest}", home.trim_end_matches('/')))
}
