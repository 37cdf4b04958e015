//! Command dispatch across the Docker API and SSH backends.
//!
//! A [`Dispatcher`] executes one logical operation against one host. It
//! resolves the host into a [`Backend`], opens whatever connection that
//! backend needs, runs the operation, and normalises the outcome:
//!
//! | Operation | API host | SSH host |
//! |---|---|---|
//! | list containers | engine listing, stopped included | `docker ps -a --format '{{json .}}'` |
//! | start container | inspect, then start | `docker start <id>` |
//! | Compose verbs | refused | `cd <dir> && docker compose -f <file> <verb>` |
//!
//! SSH failures of any kind become [`DispatchError::RemoteExecution`]; engine
//! failures become [`DispatchError::ApiExecution`]. Nothing is retried and
//! nothing is logged at error level here; the HTTP boundary owns that.

mod compose;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bollard::models::ContainerSummary;
use mockable::DefaultEnv;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::backend::{
    ApiTarget, Backend, DaemonConnector, RemoteShell, SshTarget, describe_daemon_error, quote,
    resolve,
};
use crate::config::{DockerConfig, SshConfig};
use crate::error::DispatchError;
use crate::registry::{ConnectionKind, Host};

pub use compose::{ComposeProject, ComposeVerb};

/// Length of the short container id reported for API hosts.
const SHORT_ID_LEN: usize = 12;

/// Command used to list containers on SSH hosts.
pub const LIST_CONTAINERS_COMMAND: &str = "docker ps -a --format '{{json .}}'";

/// A container as reported by an API host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Twelve-character short id.
    pub id: String,
    /// Primary name without the leading `/`.
    pub name: String,
    /// Engine state, e.g. `running` or `exited`.
    pub status: String,
}

impl From<&ContainerSummary> for ContainerInfo {
    fn from(summary: &ContainerSummary) -> Self {
        let id = summary
            .id
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(SHORT_ID_LEN)
            .collect();
        let name = summary
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|name| String::from(name.trim_start_matches('/')))
            .unwrap_or_default();
        let status = summary
            .state
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        Self { id, name, status }
    }
}

/// Containers on a host, in the shape its backend produces.
///
/// Serialises as a bare JSON array either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContainerList {
    /// Structured summaries from the Docker Engine API.
    Engine(Vec<ContainerInfo>),
    /// One object per line of `docker ps --format '{{json .}}'`.
    Shell(Vec<Value>),
}

/// Per-call deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit for one remote command, session setup included.
    pub ssh_command: Duration,
    /// Limit for one engine API call.
    pub docker: Duration,
}

impl Timeouts {
    /// Build deadlines from the `[ssh]` and `[docker]` configuration tables.
    #[must_use]
    pub const fn from_config(ssh: &SshConfig, docker: &DockerConfig) -> Self {
        Self {
            ssh_command: Duration::from_secs(ssh.command_timeout_secs),
            docker: Duration::from_secs(docker.timeout_secs),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_config(&SshConfig::default(), &DockerConfig::default())
    }
}

/// Routes operations to the backend a host is served by.
pub struct Dispatcher<E = DefaultEnv> {
    shell: Arc<dyn RemoteShell>,
    connector: Arc<dyn DaemonConnector>,
    env: Arc<E>,
    timeouts: Timeouts,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            shell: Arc::clone(&self.shell),
            connector: Arc::clone(&self.connector),
            env: Arc::clone(&self.env),
            timeouts: self.timeouts,
        }
    }
}

impl<E: mockable::Env> Dispatcher<E> {
    /// Create a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(
        shell: Arc<dyn RemoteShell>,
        connector: Arc<dyn DaemonConnector>,
        env: E,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            shell,
            connector,
            env: Arc::new(env),
            timeouts,
        }
    }

    /// List every container on `host`, stopped ones included.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Configuration` if the host record is
    /// incomplete, `DispatchError::ApiExecution` for engine failures and
    /// `DispatchError::RemoteExecution` for SSH failures or unparseable
    /// output.
    pub async fn list_containers(&self, host: &Host) -> Result<ContainerList, DispatchError> {
        match resolve(host, self.env.as_ref())? {
            Backend::Api(target) => {
                debug!(host_id = host.id, endpoint = %target.endpoint, "listing containers via engine API");
                let client = self.connector.connect(&target)?;
                let summaries = self
                    .daemon_call(&target, client.list_containers())
                    .await?;
                Ok(ContainerList::Engine(
                    summaries.iter().map(ContainerInfo::from).collect(),
                ))
            }
            Backend::Ssh(target) => {
                let stdout = self.run_remote(host, &target, LIST_CONTAINERS_COMMAND).await?;
                parse_container_lines(&stdout).map(ContainerList::Shell)
            }
        }
    }

    /// Start a container on `host`.
    ///
    /// API hosts inspect the container first, so an unknown id fails before
    /// any start is attempted. SSH hosts run `docker start` directly.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Configuration` if the host record is
    /// incomplete, `DispatchError::ApiExecution` for engine failures
    /// (including an unknown id) and `DispatchError::RemoteExecution` for SSH
    /// failures.
    pub async fn start_container(
        &self,
        host: &Host,
        container_id: &str,
    ) -> Result<(), DispatchError> {
        match resolve(host, self.env.as_ref())? {
            Backend::Api(target) => {
                debug!(host_id = host.id, endpoint = %target.endpoint, container_id, "starting container via engine API");
                let client = self.connector.connect(&target)?;
                self.daemon_call(&target, client.inspect_container(container_id))
                    .await?;
                self.daemon_call(&target, client.start_container(container_id))
                    .await
            }
            Backend::Ssh(target) => {
                let command = format!("docker start {}", quote(container_id));
                self.run_remote(host, &target, &command).await.map(|_| ())
            }
        }
    }

    /// Run a Compose verb for `project` on `host`.
    ///
    /// The host kind is checked before anything is resolved or built, so an
    /// API host never has its endpoint inspected.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::BackendUnsupported` for API hosts,
    /// `DispatchError::Configuration` for incomplete SSH records and
    /// `DispatchError::RemoteExecution` for SSH failures.
    pub async fn compose(
        &self,
        host: &Host,
        project: &ComposeProject,
        verb: ComposeVerb,
    ) -> Result<String, DispatchError> {
        if host.connection() == ConnectionKind::Api {
            return Err(unsupported(verb));
        }

        let Backend::Ssh(target) = resolve(host, self.env.as_ref())? else {
            return Err(unsupported(verb));
        };
        self.run_remote(host, &target, &project.command(verb)).await
    }

    async fn run_remote(
        &self,
        host: &Host,
        target: &SshTarget,
        command: &str,
    ) -> Result<String, DispatchError> {
        debug!(
            host_id = host.id,
            address = %target.address,
            user = %target.user,
            sudo = target.sudo.is_some(),
            command,
            "dispatching remote command"
        );

        let seconds = self.timeouts.ssh_command.as_secs();
        let output = tokio::time::timeout(self.timeouts.ssh_command, self.shell.run(target, command))
            .await
            .map_err(|_| DispatchError::RemoteExecution {
                message: format!("timed out after {seconds} seconds"),
            })?
            .map_err(|e| DispatchError::RemoteExecution {
                message: e.to_string(),
            })?;

        if output.succeeded() {
            return Ok(String::from(output.stdout.trim()));
        }

        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            output.exit_status.map_or_else(
                || String::from("channel closed without an exit status"),
                |code| format!("exit status {code}"),
            )
        } else {
            String::from(stderr)
        };
        Err(DispatchError::RemoteExecution { message })
    }

    async fn daemon_call<T>(
        &self,
        target: &ApiTarget,
        call: impl Future<Output = Result<T, bollard::errors::Error>>,
    ) -> Result<T, DispatchError> {
        let seconds = self.timeouts.docker.as_secs();
        tokio::time::timeout(self.timeouts.docker, call)
            .await
            .map_err(|_| DispatchError::ApiExecution {
                message: format!("timed out after {seconds} seconds"),
            })?
            .map_err(|e| DispatchError::ApiExecution {
                message: describe_daemon_error(&e, &target.endpoint),
            })
    }
}

fn unsupported(verb: ComposeVerb) -> DispatchError {
    DispatchError::BackendUnsupported {
        operation: verb.to_string(),
    }
}

/// Parse `docker ps --format '{{json .}}'` output, one object per non-blank
/// line.
///
/// # Errors
///
/// Returns `DispatchError::RemoteExecution` if a line is not valid JSON.
pub fn parse_container_lines(stdout: &str) -> Result<Vec<Value>, DispatchError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| DispatchError::RemoteExecution {
                message: format!("unexpected docker ps output: {e}"),
            })
        })
        .collect()
}
