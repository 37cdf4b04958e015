//! Semantic error types for the dockhand service.
//!
//! Each domain owns a `thiserror` enum: configuration loading, the registry,
//! backend dispatch, and the HTTP server. Callers match on these to pick an
//! HTTP status; the binary converts whatever reaches `main` into an
//! `eyre::Report`.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Record kinds held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A registered Docker host.
    Host,
    /// A Compose stack bound to a host.
    Stack,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("Host"),
            Self::Stack => f.write_str("Stack"),
        }
    }
}

/// Errors raised by the host and stack registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Which table was queried.
        kind: RecordKind,
        /// The identifier that was looked up.
        id: i64,
    },

    /// A host cannot be deleted while stacks still reference it.
    #[error("host {id} is still referenced by {stacks} stack(s)")]
    HostInUse {
        /// The host identifier.
        id: i64,
        /// Number of stacks bound to the host.
        stacks: i64,
    },

    /// A submitted record failed validation.
    #[error("invalid {kind} record: {reason}")]
    InvalidRecord {
        /// Which record kind was rejected.
        kind: RecordKind,
        /// Why the record was rejected.
        reason: String,
    },

    /// The storage layer failed.
    #[error("storage failure: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

impl From<sqlx::Error> for RegistryError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage {
            message: error.to_string(),
        }
    }
}

/// Errors raised while resolving a backend or executing an operation on it.
///
/// SSH and Docker API failures deliberately stay separate: their causes and
/// diagnostics differ.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A host record lacks a field its connection kind requires.
    #[error("host configuration error: {field} {reason}")]
    Configuration {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The operation cannot run over the host's connection kind.
    #[error("{operation} requires SSH access")]
    BackendUnsupported {
        /// The operation that was refused.
        operation: String,
    },

    /// Any SSH-path failure: connect, authentication, or non-zero exit.
    #[error("SSH command failed: {message}")]
    RemoteExecution {
        /// The original failure text.
        message: String,
    },

    /// Any Docker Engine API failure.
    #[error("Docker API call failed: {message}")]
    ApiExecution {
        /// The original failure text.
        message: String,
    },
}

impl DispatchError {
    /// Build a configuration error for a field that must be present.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::Configuration {
            field,
            reason: String::from("is required"),
        }
    }
}

/// Errors raised by the HTTP server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {address}: {message}")]
    BindFailed {
        /// The configured listen address.
        address: String,
        /// A description of the bind failure.
        message: String,
    },

    /// The server stopped with an I/O error.
    #[error("server terminated: {message}")]
    Terminated {
        /// A description of the failure.
        message: String,
    },
}

/// Top-level error type for dockhand.
#[derive(Debug, Error)]
pub enum DockhandError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An error occurred while dispatching an operation.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// An error occurred in the HTTP server.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A specialised `Result` type for dockhand operations.
pub type Result<T> = std::result::Result<T, DockhandError>;
