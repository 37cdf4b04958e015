//! Scenario state for stack operation behavioural tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dockhand::backend::{
    ApiTarget, DaemonClient, DaemonConnector, RemoteOutput, RemoteShell, RemoteShellFuture,
    SshTarget, SudoIdentity,
};
use dockhand::error::DispatchError;
use dockhand::registry::{ConnectionKind, DEFAULT_SSH_PORT, HostSpec};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// One command as the fake shell received it.
#[derive(Debug, Clone)]
pub(crate) struct IssuedCommand {
    pub(crate) command: String,
    pub(crate) sudo: Option<SudoIdentity>,
}

/// A remote shell that records every command and replies with a canned
/// result.
#[derive(Debug, Default)]
pub(crate) struct RecordingShell {
    issued: Mutex<Vec<IssuedCommand>>,
    failure: Mutex<Option<String>>,
}

impl RecordingShell {
    pub(crate) fn fail_with(&self, stderr: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(String::from(stderr));
    }

    pub(crate) fn issued(&self) -> Vec<IssuedCommand> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RemoteShell for RecordingShell {
    fn run(&self, target: &SshTarget, command: &str) -> RemoteShellFuture<'_> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(IssuedCommand {
                command: String::from(command),
                sudo: target.sudo.clone(),
            });
        let reply = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map_or_else(
                || RemoteOutput {
                    stdout: String::from("  done\n"),
                    stderr: String::new(),
                    exit_status: Some(0),
                },
                |stderr| RemoteOutput {
                    stdout: String::new(),
                    stderr,
                    exit_status: Some(1),
                },
            );
        Box::pin(async move { Ok(reply) })
    }
}

/// A daemon connector that counts connection attempts.
#[derive(Debug, Default)]
pub(crate) struct CountingConnector {
    connects: AtomicUsize,
}

impl CountingConnector {
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl DaemonConnector for CountingConnector {
    fn connect(&self, _target: &ApiTarget) -> Result<Box<dyn DaemonClient>, DispatchError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::ApiExecution {
            message: String::from("no daemon available"),
        })
    }
}

/// High-level outcome of running one or more verbs.
#[derive(Debug, Clone)]
pub(crate) enum StackOutcome {
    /// Every verb returned stdout.
    Succeeded(Vec<String>),
    /// A verb failed.
    Failed(FailureKind, String),
}

/// Which error class a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Configuration,
    Unsupported,
    Remote,
    Api,
}

impl From<&DispatchError> for FailureKind {
    fn from(error: &DispatchError) -> Self {
        match error {
            DispatchError::Configuration { .. } => Self::Configuration,
            DispatchError::BackendUnsupported { .. } => Self::Unsupported,
            DispatchError::RemoteExecution { .. } => Self::Remote,
            DispatchError::ApiExecution { .. } => Self::Api,
        }
    }
}

#[derive(Default, ScenarioState)]
pub(crate) struct StackState {
    pub(crate) host: Slot<HostSpec>,
    pub(crate) compose_file: Slot<String>,
    pub(crate) shell: Slot<Arc<RecordingShell>>,
    pub(crate) connector: Slot<Arc<CountingConnector>>,
    pub(crate) outcome: Slot<StackOutcome>,
}

/// A host record with every optional field empty.
pub(crate) fn blank_host(connection: ConnectionKind) -> HostSpec {
    HostSpec {
        name: String::from("scenario-host"),
        connection,
        endpoint_url: None,
        address: None,
        ssh_user: None,
        ssh_key_path: None,
        ssh_port: DEFAULT_SSH_PORT,
        sudo_user: None,
        sudo_password: None,
    }
}

#[fixture]
pub(crate) fn stack_state() -> StackState {
    let state = StackState::default();
    state.shell.set(Arc::new(RecordingShell::default()));
    state.connector.set(Arc::new(CountingConnector::default()));
    state
}
