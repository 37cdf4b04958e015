//! Docker Engine API access through `bollard`.
//!
//! Two seams keep dispatch logic testable without a live daemon:
//! [`DaemonConnector`] turns an [`ApiTarget`] into a client, and
//! [`DaemonClient`] exposes the three engine calls the dispatcher needs.

mod error_classification;

use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerInspectResponse, ContainerSummary};
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptionsBuilder, StartContainerOptions,
};

use super::ApiTarget;
use super::resolve::tls_unsupported;
use crate::error::DispatchError;

pub use error_classification::describe_daemon_error;

/// Boxed future type returned by [`DaemonClient::list_containers`].
pub type ListContainersFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ContainerSummary>, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`DaemonClient::inspect_container`].
pub type InspectContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContainerInspectResponse, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`DaemonClient::start_container`].
pub type StartContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), BollardError>> + Send + 'a>>;

/// Engine calls used by the dispatcher.
pub trait DaemonClient: Send + Sync {
    /// List every container, stopped ones included.
    fn list_containers(&self) -> ListContainersFuture<'_>;

    /// Inspect a container by id or name.
    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_>;

    /// Start a container by id or name.
    fn start_container(&self, container_id: &str) -> StartContainerFuture<'_>;
}

impl DaemonClient for Docker {
    fn list_containers(&self) -> ListContainersFuture<'_> {
        let options = ListContainersOptionsBuilder::new().all(true).build();
        Box::pin(async move { Self::list_containers(self, Some(options)).await })
    }

    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::inspect_container(self, &container_id_owned, None::<InspectContainerOptions>)
                .await
        })
    }

    fn start_container(&self, container_id: &str) -> StartContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::start_container(self, &container_id_owned, None::<StartContainerOptions>).await
        })
    }
}

/// Opens a [`DaemonClient`] for an API target.
pub trait DaemonConnector: Send + Sync {
    /// Build a client for `target`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::ApiExecution` if the endpoint cannot be used.
    fn connect(&self, target: &ApiTarget) -> Result<Box<dyn DaemonClient>, DispatchError>;
}

/// Classifies endpoint strings for connection handling.
enum EndpointType {
    /// Unix socket or Windows named pipe with explicit scheme.
    Socket,
    /// HTTP or TCP endpoint (TCP is rewritten to HTTP).
    Http,
    /// HTTPS endpoint, refused.
    Tls,
    /// Bare path without scheme prefix.
    BarePath,
}

impl EndpointType {
    fn is_socket_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("unix://") || endpoint.starts_with("npipe://")
    }

    fn is_http_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("tcp://") || endpoint.starts_with("http://")
    }

    fn classify(endpoint: &str) -> Self {
        match (
            Self::is_socket_scheme(endpoint),
            Self::is_http_scheme(endpoint),
            endpoint.starts_with("https://"),
        ) {
            (true, _, _) => Self::Socket,
            (_, true, _) => Self::Http,
            (_, _, true) => Self::Tls,
            _ => Self::BarePath,
        }
    }
}

/// Connects to Docker engines with `bollard`.
///
/// Supported endpoint formats:
/// - Unix sockets: `unix:///path/to/socket`
/// - Windows named pipes: `npipe:////./pipe/name`
/// - TCP: `tcp://host:port` (treated as HTTP)
/// - HTTP: `http://host:port`
///
/// `https://` endpoints are refused with a configuration error.
/// - Bare paths: paths starting with `\\` or `//` are named pipes, all other
///   paths are Unix sockets. Detection is syntax-based, not platform-based.
#[derive(Debug, Clone, Copy)]
pub struct BollardConnector {
    timeout_secs: u64,
}

impl BollardConnector {
    /// Create a connector whose clients time out requests after
    /// `timeout_secs`.
    #[must_use]
    pub const fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Build a `bollard` client for `endpoint`.
    ///
    /// No request is sent; an unreachable daemon surfaces on first use.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Configuration` for `https://` endpoints and
    /// `DispatchError::ApiExecution` if `bollard` rejects the endpoint.
    pub fn docker(&self, endpoint: &str) -> Result<Docker, DispatchError> {
        let connected = match EndpointType::classify(endpoint) {
            EndpointType::Tls => return Err(tls_unsupported()),
            EndpointType::Socket => Docker::connect_with_socket(
                endpoint,
                self.timeout_secs,
                bollard::API_DEFAULT_VERSION,
            ),
            EndpointType::Http => {
                // Rewrite tcp:// to http:// for Bollard compatibility
                let http_endpoint = if endpoint.starts_with("tcp://") {
                    endpoint.replacen("tcp://", "http://", 1)
                } else {
                    endpoint.to_owned()
                };
                Docker::connect_with_http(
                    &http_endpoint,
                    self.timeout_secs,
                    bollard::API_DEFAULT_VERSION,
                )
            }
            EndpointType::BarePath => Docker::connect_with_socket(
                &normalize_bare_path(endpoint),
                self.timeout_secs,
                bollard::API_DEFAULT_VERSION,
            ),
        };

        connected.map_err(|e| DispatchError::ApiExecution {
            message: describe_daemon_error(&e, endpoint),
        })
    }
}

impl DaemonConnector for BollardConnector {
    fn connect(&self, target: &ApiTarget) -> Result<Box<dyn DaemonClient>, DispatchError> {
        let docker = self.docker(&target.endpoint)?;
        Ok(Box::new(docker))
    }
}

/// Normalise a bare socket path to a URI with the appropriate scheme.
///
/// Paths starting with `\\` or `//` are Windows named pipes
/// (e.g. `\\.\pipe\docker_engine`); everything else is a Unix socket.
fn normalize_bare_path(path: &str) -> String {
    if path.starts_with("\\\\") || path.starts_with("//") {
        format!("npipe://{path}")
    } else {
        format!("unix://{path}")
    }
}
