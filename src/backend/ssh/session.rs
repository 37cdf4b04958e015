//! `russh`-backed implementation of [`RemoteShell`].

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use russh::client::{AuthResult, Config, Handle, Handler};
use russh::keys::PrivateKeyWithHashAlg;
use russh::keys::ssh_key::PublicKey;
use russh::{ChannelMsg, Disconnect};
use tracing::{debug, info, warn};

use super::{
    RemoteOutput, RemoteShell, RemoteShellFuture, SshError, remote_command_line, stdin_payload,
};
use crate::backend::SshTarget;

/// Trust-on-first-use host key checking against a known-hosts file.
#[derive(Clone, Debug)]
struct KnownHostsHandler {
    host: String,
    port: u16,
    known_hosts: Option<Utf8PathBuf>,
}

impl Handler for KnownHostsHandler {
    type Error = SshError;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, SshError> {
        verify_host_key(
            &self.host,
            self.port,
            server_public_key,
            self.known_hosts.as_deref(),
        )
    }
}

/// Check `key` for `host:port` against `known_hosts` (the user's
/// `~/.ssh/known_hosts` when `None`).
///
/// A host with no entry has its key recorded and is accepted. A host whose
/// recorded key differs is refused.
///
/// # Errors
///
/// Returns `SshError::Connect` if the key changed or the file cannot be read
/// or written.
fn verify_host_key(
    host: &str,
    port: u16,
    key: &PublicKey,
    known_hosts: Option<&Utf8Path>,
) -> Result<bool, SshError> {
    let address = format!("{host}:{port}");
    let refuse = |message: String| {
        warn!(address = %address, reason = %message, "host key refused");
        SshError::Connect {
            address: address.clone(),
            message,
        }
    };

    let known = match known_hosts {
        Some(path) => russh::keys::check_known_hosts_path(host, port, key, path),
        None => russh::keys::check_known_hosts(host, port, key),
    }
    .map_err(|e| refuse(format!("host key verification failed: {e}")))?;
    if known {
        return Ok(true);
    }

    info!(address = %address, "recording host key seen for the first time");
    match known_hosts {
        Some(path) => russh::keys::known_hosts::learn_known_hosts_path(host, port, key, path),
        None => russh::keys::known_hosts::learn_known_hosts(host, port, key),
    }
    .map_err(|e| refuse(format!("failed to record host key: {e}")))?;
    Ok(true)
}

/// Opens a fresh SSH session for every command.
#[derive(Debug, Clone)]
pub struct RusshShell {
    config: Arc<Config>,
    connect_timeout: Duration,
    known_hosts: Option<Utf8PathBuf>,
}

impl RusshShell {
    /// Create a shell whose session setup (TCP connect, handshake and
    /// authentication) must finish within `connect_timeout`. Host keys are
    /// checked against `known_hosts`, or `~/.ssh/known_hosts` when `None`.
    #[must_use]
    pub fn new(connect_timeout: Duration, known_hosts: Option<Utf8PathBuf>) -> Self {
        let config = Config {
            inactivity_timeout: None,
            ..Default::default()
        };
        Self {
            config: Arc::new(config),
            connect_timeout,
            known_hosts,
        }
    }

    async fn open(&self, target: &SshTarget) -> Result<Handle<KnownHostsHandler>, SshError> {
        let address = format!("{}:{}", target.address, target.port);
        let handler = KnownHostsHandler {
            host: target.address.clone(),
            port: target.port,
            known_hosts: self.known_hosts.clone(),
        };
        let mut handle = russh::client::connect(
            Arc::clone(&self.config),
            (target.address.as_str(), target.port),
            handler,
        )
        .await
        .map_err(|e| match e {
            SshError::Channel { message } => SshError::Connect {
                address: address.clone(),
                message,
            },
            other => other,
        })?;

        let key = russh::keys::load_secret_key(&target.key_path, None).map_err(|e| {
            SshError::Key {
                path: target.key_path.clone(),
                message: e.to_string(),
            }
        })?;
        let hash = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| SshError::Connect {
                address: address.clone(),
                message: e.to_string(),
            })?
            .flatten();

        let auth = handle
            .authenticate_publickey(
                target.user.clone(),
                PrivateKeyWithHashAlg::new(Arc::new(key), hash),
            )
            .await
            .map_err(|e| SshError::Connect {
                address,
                message: e.to_string(),
            })?;

        match auth {
            AuthResult::Success => Ok(handle),
            AuthResult::Failure { .. } => Err(SshError::AuthRejected {
                user: target.user.clone(),
            }),
        }
    }

    async fn execute(
        handle: &Handle<KnownHostsHandler>,
        command_line: &str,
        stdin: Option<String>,
    ) -> Result<RemoteOutput, SshError> {
        let mut channel = handle.channel_open_session().await?;
        channel.exec(true, command_line).await?;
        if let Some(payload) = stdin {
            channel.data(payload.as_bytes()).await?;
        }
        channel.eof().await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            if collect_message(&msg, &mut stdout, &mut stderr, &mut exit_status) {
                break;
            }
        }

        Ok(RemoteOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }

    async fn run_owned(
        &self,
        target: SshTarget,
        command: String,
    ) -> Result<RemoteOutput, SshError> {
        let seconds = self.connect_timeout.as_secs();
        let handle = tokio::time::timeout(self.connect_timeout, self.open(&target))
            .await
            .map_err(|_| SshError::Timeout { seconds })??;

        let command_line = remote_command_line(&command, target.sudo.as_ref());
        debug!(
            address = %target.address,
            user = %target.user,
            sudo_user = target.sudo.as_ref().map(|sudo| sudo.user.as_str()),
            command = %command,
            "running remote command"
        );

        let result =
            Self::execute(&handle, &command_line, stdin_payload(target.sudo.as_ref())).await;

        if let Err(e) = handle.disconnect(Disconnect::ByApplication, "", "en").await {
            debug!(error = %e, "SSH disconnect failed");
        }

        result
    }
}

/// Fold one channel message into the captured output.
///
/// Returns `true` once the channel has closed.
fn collect_message(
    msg: &ChannelMsg,
    stdout: &mut Vec<u8>,
    stderr: &mut Vec<u8>,
    exit_status: &mut Option<u32>,
) -> bool {
    match msg {
        ChannelMsg::Data { data } => {
            stdout.extend_from_slice(data);
            false
        }
        ChannelMsg::ExtendedData { data, ext: 1 } => {
            stderr.extend_from_slice(data);
            false
        }
        ChannelMsg::ExitStatus { exit_status: code } => {
            *exit_status = Some(*code);
            false
        }
        ChannelMsg::Close => true,
        _ => false,
    }
}

impl RemoteShell for RusshShell {
    fn run(&self, target: &SshTarget, command: &str) -> RemoteShellFuture<'_> {
        let target_owned = target.clone();
        let command_owned = String::from(command);
        Box::pin(async move { self.run_owned(target_owned, command_owned).await })
    }
}
