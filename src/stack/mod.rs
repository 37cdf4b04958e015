//! Compose lifecycle operations for a registered stack.
//!
//! [`StackOperations`] binds a stack to its host and a [`Dispatcher`]. All
//! checks that do not need the network happen at construction, so a facade
//! that exists can only fail at the remote end.

mod locks;

use std::sync::Arc;

use mockable::DefaultEnv;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::dispatch::{ComposeProject, ComposeVerb, Dispatcher};
use crate::error::DispatchError;
use crate::registry::{ConnectionKind, Host, Stack};

pub use locks::StackLocks;

/// The four Compose verbs bound to one stack.
pub struct StackOperations<E = DefaultEnv> {
    stack: Stack,
    host: Host,
    project: ComposeProject,
    dispatcher: Dispatcher<E>,
    lock: Arc<AsyncMutex<()>>,
}

impl<E: mockable::Env> StackOperations<E> {
    /// Bind `stack` to `host`.
    ///
    /// Without [`Self::with_lock`] the facade only serialises its own calls.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::BackendUnsupported` if the host is API-mode,
    /// and `DispatchError::Configuration` if the stack belongs to another host
    /// (field `host_id`) or its Compose path is unusable (field
    /// `compose_file`).
    pub fn new(stack: Stack, host: Host, dispatcher: Dispatcher<E>) -> Result<Self, DispatchError> {
        if host.connection() == ConnectionKind::Api {
            return Err(DispatchError::BackendUnsupported {
                operation: String::from("compose"),
            });
        }
        if stack.host_id != host.id {
            return Err(DispatchError::Configuration {
                field: "host_id",
                reason: format!(
                    "stack {} belongs to host {}, not host {}",
                    stack.id, stack.host_id, host.id
                ),
            });
        }
        let project = ComposeProject::from_compose_file(&stack.spec.compose_file)?;

        Ok(Self {
            stack,
            host,
            project,
            dispatcher,
            lock: Arc::new(AsyncMutex::new(())),
        })
    }

    /// Share the per-stack mutex from `locks`, so verbs issued through any
    /// facade for this stack run one at a time.
    #[must_use]
    pub fn with_lock(mut self, locks: &StackLocks) -> Self {
        self.lock = locks.lock_for(self.stack.id);
        self
    }

    /// `docker compose up -d`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RemoteExecution` if the command fails.
    pub async fn up(&self) -> Result<String, DispatchError> {
        self.run(ComposeVerb::Up).await
    }

    /// `docker compose down`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RemoteExecution` if the command fails.
    pub async fn down(&self) -> Result<String, DispatchError> {
        self.run(ComposeVerb::Down).await
    }

    /// `docker compose ps`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RemoteExecution` if the command fails.
    pub async fn ps(&self) -> Result<String, DispatchError> {
        self.run(ComposeVerb::Ps).await
    }

    /// `docker compose restart`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RemoteExecution` if the command fails.
    pub async fn restart(&self) -> Result<String, DispatchError> {
        self.run(ComposeVerb::Restart).await
    }

    /// Run any verb.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RemoteExecution` if the command fails.
    pub async fn run(&self, verb: ComposeVerb) -> Result<String, DispatchError> {
        let _guard = self.lock.lock().await;
        info!(
            stack_id = self.stack.id,
            host_id = self.host.id,
            directory = %self.project.directory(),
            %verb,
            "running stack operation"
        );
        let stdout = self
            .dispatcher
            .compose(&self.host, &self.project, verb)
            .await?;
        debug!(stack_id = self.stack.id, %verb, bytes = stdout.len(), "stack operation finished");
        Ok(stdout)
    }
}
