//! Backend resolution and the collaborators that talk to remote hosts.
//!
//! A host is served either by its Docker Engine API or by shell commands run
//! over SSH. [`resolve`] turns a host record into a [`Backend`] descriptor;
//! the [`DaemonConnector`] and [`RemoteShell`] seams open connections for a
//! single operation and drop them afterwards.

mod docker;
mod resolve;
mod ssh;

pub use docker::{
    BollardConnector, DaemonClient, DaemonConnector, InspectContainerFuture, ListContainersFuture,
    StartContainerFuture, describe_daemon_error,
};
pub use resolve::{ApiTarget, Backend, SshTarget, SudoIdentity, resolve};
pub use ssh::{
    RemoteOutput, RemoteShell, RemoteShellFuture, RusshShell, SshError, quote,
    remote_command_line, single_quote, stdin_payload,
};
