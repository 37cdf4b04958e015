//! Readable failure text for `bollard` errors.
//!
//! Engine responses keep their status code; local socket failures name the
//! socket path so operators can tell a missing daemon from a permissions
//! problem.

use std::io::ErrorKind;
use std::path::Path;

use bollard::errors::Error as BollardError;

/// Extract the filesystem path from a socket URI.
///
/// Strips the scheme prefix (`unix://`, `npipe://`). HTTP endpoints have no
/// filesystem path and yield `None`.
fn extract_socket_path(endpoint: &str) -> Option<&Path> {
    endpoint
        .strip_prefix("unix://")
        .or_else(|| endpoint.strip_prefix("npipe://"))
        .map(Path::new)
}

fn describe_io_kind(kind: ErrorKind, socket_path: Option<&Path>, fallback: String) -> String {
    match (kind, socket_path) {
        (ErrorKind::PermissionDenied, Some(path)) => {
            format!("permission denied accessing socket {}", path.display())
        }
        (ErrorKind::NotFound, Some(path)) => format!("socket not found: {}", path.display()),
        _ => fallback,
    }
}

/// Describe a `bollard` error raised while talking to `endpoint`.
#[must_use]
pub fn describe_daemon_error(error: &BollardError, endpoint: &str) -> String {
    let socket_path = extract_socket_path(endpoint);

    match error {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => return format!("{status_code}: {message}"),
        BollardError::SocketNotFoundError(_) => {
            if let Some(path) = socket_path {
                return format!("socket not found: {}", path.display());
            }
        }
        BollardError::IOError { err } => {
            let kind = io_error_kind_in_chain(err).unwrap_or_else(|| err.kind());
            return describe_io_kind(kind, socket_path, error.to_string());
        }
        _ => {}
    }

    if let Some(kind) = io_error_kind_in_chain(error) {
        return describe_io_kind(kind, socket_path, error.to_string());
    }

    error.to_string()
}

/// Walk the error source chain looking for an `io::Error` kind.
fn io_error_kind_in_chain(error: &dyn std::error::Error) -> Option<ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}
