//! HTTP boundary.
//!
//! Handlers translate requests into registry, dispatcher and stack-facade
//! calls. Every failure leaves through [`ApiError`], which picks the status
//! code, logs the request at `warn` (4xx) or `error` (5xx), and renders a
//! `{"detail": "..."}` body.

mod error;
mod extract;
mod hosts;
mod stacks;

use std::future::Future;

use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::error::ServerError;
use crate::registry::Registry;
use crate::stack::StackLocks;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath};
pub use stacks::ComposeOutput;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Host and stack records.
    pub registry: Registry,
    /// Backend dispatch for container and Compose operations.
    pub dispatcher: Dispatcher,
    /// Per-stack mutexes.
    pub locks: StackLocks,
    /// Whether Compose verbs on one stack are serialised.
    pub serialize_operations: bool,
}

impl AppState {
    /// Assemble handler state.
    #[must_use]
    pub fn new(registry: Registry, dispatcher: Dispatcher, serialize_operations: bool) -> Self {
        Self {
            registry,
            dispatcher,
            locks: StackLocks::new(),
            serialize_operations,
        }
    }
}

/// `GET /health`
#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the service router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hosts", post(hosts::create_host).get(hosts::list_hosts))
        .route(
            "/hosts/{host_id}",
            get(hosts::get_host).delete(hosts::delete_host),
        )
        .route("/hosts/{host_id}/containers", get(hosts::list_containers))
        .route(
            "/hosts/{host_id}/containers/start/{container_id}",
            post(hosts::start_container),
        )
        .route(
            "/hosts/{host_id}/stacks",
            post(hosts::create_stack).get(hosts::list_stacks),
        )
        .route(
            "/stacks/{stack_id}",
            get(stacks::get_stack).delete(stacks::delete_stack),
        )
        .route("/stacks/{stack_id}/up", post(stacks::up))
        .route("/stacks/{stack_id}/down", post(stacks::down))
        .route("/stacks/{stack_id}/ps", get(stacks::ps))
        .route("/stacks/{stack_id}/restart", post(stacks::restart))
        .with_state(state)
}

/// Bind `listen` and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns `ServerError::BindFailed` if the address cannot be bound and
/// `ServerError::Terminated` if the server stops with an I/O error.
pub async fn serve<F>(listen: &str, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| ServerError::BindFailed {
            address: String::from(listen),
            message: e.to_string(),
        })?;
    let local = listener
        .local_addr()
        .map_or_else(|_| String::from(listen), |addr| addr.to_string());
    info!(address = %local, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Terminated {
            message: e.to_string(),
        })?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on `SIGTERM` where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown requested");
}
