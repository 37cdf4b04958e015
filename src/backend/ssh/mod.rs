//! Remote shell execution over SSH.
//!
//! [`RemoteShell`] is the seam the dispatcher talks to. The production
//! implementation, [`RusshShell`], opens one session per call, optionally
//! switches identity through `sudo`, and captures stdout, stderr and the exit
//! status. Interpreting the exit status is left to the caller.

mod quote;
mod session;

use std::future::Future;
use std::pin::Pin;

use super::{SshTarget, SudoIdentity};

pub use quote::{quote, single_quote};
pub use session::RusshShell;

/// Captured result of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
    /// Exit status reported by the remote side; `None` if the channel closed
    /// without one.
    pub exit_status: Option<u32>,
}

impl RemoteOutput {
    /// Whether the command reported a zero exit status.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_status, Some(0))
    }
}

/// Failures while establishing or driving an SSH session.
#[derive(Debug, thiserror::Error)]
pub enum SshError {
    /// TCP connect or SSH handshake failed.
    #[error("connection to {address} failed: {message}")]
    Connect {
        /// `host:port` that was dialled.
        address: String,
        /// Underlying failure text.
        message: String,
    },

    /// The private key could not be loaded.
    #[error("failed to load key {path}: {message}")]
    Key {
        /// Key path on the controller.
        path: String,
        /// Underlying failure text.
        message: String,
    },

    /// The server rejected public-key authentication.
    #[error("authentication as {user} was rejected")]
    AuthRejected {
        /// The login user.
        user: String,
    },

    /// Opening the channel, sending the command, or feeding stdin failed.
    #[error("channel failure: {message}")]
    Channel {
        /// Underlying failure text.
        message: String,
    },

    /// A deadline expired.
    #[error("timed out after {seconds} seconds")]
    Timeout {
        /// The configured limit.
        seconds: u64,
    },
}

impl From<russh::Error> for SshError {
    fn from(error: russh::Error) -> Self {
        Self::Channel {
            message: error.to_string(),
        }
    }
}

/// Boxed future type returned by [`RemoteShell::run`].
pub type RemoteShellFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RemoteOutput, SshError>> + Send + 'a>>;

/// Behaviour required to run one shell command on a remote host.
///
/// This abstraction keeps dispatch logic testable without an SSH server.
pub trait RemoteShell: Send + Sync {
    /// Run `command` on `target`, switching to `target.sudo` when present.
    fn run(&self, target: &SshTarget, command: &str) -> RemoteShellFuture<'_>;
}

/// The command line actually sent to the remote host.
///
/// Without a sudo identity the command is sent as-is. With one, it is run by
/// `sh -c` under `sudo -S`, with an empty prompt so that nothing leaks into
/// the captured stderr.
#[must_use]
pub fn remote_command_line(command: &str, sudo: Option<&SudoIdentity>) -> String {
    sudo.map_or_else(
        || String::from(command),
        |identity| {
            format!(
                "sudo -S -p '' -H -u {} -- sh -c {}",
                quote(&identity.user),
                single_quote(command)
            )
        },
    )
}

/// Bytes written to the remote stdin before EOF.
///
/// Only a sudo password is ever written.
#[must_use]
pub fn stdin_payload(sudo: Option<&SudoIdentity>) -> Option<String> {
    sudo.and_then(|identity| identity.password.as_ref())
        .map(|password| format!("{password}\n"))
}
