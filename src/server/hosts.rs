//! Host registration and container handlers.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};
use tracing::instrument;

use super::{ApiError, ApiJson, ApiPath, AppState};
use crate::dispatch::ContainerList;
use crate::registry::{Host, HostSpec, Stack, StackSpec};

/// `POST /hosts`
///
/// # Errors
///
/// Returns 400 for an invalid record and 500 for storage failures.
#[instrument(skip(state, spec), fields(name = %spec.name, connection = %spec.connection))]
pub async fn create_host(
    State(state): State<AppState>,
    ApiJson(spec): ApiJson<HostSpec>,
) -> Result<Json<Host>, ApiError> {
    Ok(Json(state.registry.register_host(&spec).await?))
}

/// `GET /hosts`
///
/// # Errors
///
/// Returns 500 for storage failures.
#[instrument(skip(state))]
pub async fn list_hosts(State(state): State<AppState>) -> Result<Json<Vec<Host>>, ApiError> {
    Ok(Json(state.registry.list_hosts().await?))
}

/// `GET /hosts/{host_id}`
///
/// # Errors
///
/// Returns 404 if the host does not exist.
#[instrument(skip(state))]
pub async fn get_host(
    State(state): State<AppState>,
    ApiPath(host_id): ApiPath<i64>,
) -> Result<Json<Host>, ApiError> {
    Ok(Json(state.registry.get_host(host_id).await?))
}

/// `DELETE /hosts/{host_id}`
///
/// # Errors
///
/// Returns 404 if the host does not exist and 409 while stacks reference it.
#[instrument(skip(state))]
pub async fn delete_host(
    State(state): State<AppState>,
    ApiPath(host_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.registry.delete_host(host_id).await?;
    Ok(Json(json!({ "message": "Host deleted" })))
}

/// `GET /hosts/{host_id}/containers`
///
/// # Errors
///
/// Returns 404 for an unknown host, 400 for an incomplete host record and
/// 500 when the backend call fails.
#[instrument(skip(state))]
pub async fn list_containers(
    State(state): State<AppState>,
    ApiPath(host_id): ApiPath<i64>,
) -> Result<Json<ContainerList>, ApiError> {
    let host = state.registry.get_host(host_id).await?;
    Ok(Json(state.dispatcher.list_containers(&host).await?))
}

/// `POST /hosts/{host_id}/containers/start/{container_id}`
///
/// # Errors
///
/// Returns 404 for an unknown host, 400 for an incomplete host record and
/// 500 when the backend call fails.
#[instrument(skip(state))]
pub async fn start_container(
    State(state): State<AppState>,
    ApiPath((host_id, container_id)): ApiPath<(i64, String)>,
) -> Result<Json<Value>, ApiError> {
    let host = state.registry.get_host(host_id).await?;
    state
        .dispatcher
        .start_container(&host, &container_id)
        .await?;
    Ok(Json(
        json!({ "message": format!("Started container {container_id}") }),
    ))
}

/// `POST /hosts/{host_id}/stacks`
///
/// # Errors
///
/// Returns 404 for an unknown host and 400 for an invalid record.
#[instrument(skip(state, spec), fields(name = %spec.name))]
pub async fn create_stack(
    State(state): State<AppState>,
    ApiPath(host_id): ApiPath<i64>,
    ApiJson(spec): ApiJson<StackSpec>,
) -> Result<Json<Stack>, ApiError> {
    Ok(Json(state.registry.register_stack(host_id, &spec).await?))
}

/// `GET /hosts/{host_id}/stacks`
///
/// # Errors
///
/// Returns 404 for an unknown host.
#[instrument(skip(state))]
pub async fn list_stacks(
    State(state): State<AppState>,
    ApiPath(host_id): ApiPath<i64>,
) -> Result<Json<Vec<Stack>>, ApiError> {
    Ok(Json(state.registry.list_stacks(host_id).await?))
}
