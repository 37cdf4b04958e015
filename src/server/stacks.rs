//! Stack lookup and Compose verb handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::{ApiError, ApiPath, AppState};
use crate::dispatch::ComposeVerb;
use crate::registry::Stack;
use crate::stack::StackOperations;

/// Body returned by every Compose verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeOutput {
    /// Trimmed stdout of the remote command.
    pub output: String,
}

/// `GET /stacks/{stack_id}`
///
/// # Errors
///
/// Returns 404 if the stack does not exist.
#[instrument(skip(state))]
pub async fn get_stack(
    State(state): State<AppState>,
    ApiPath(stack_id): ApiPath<i64>,
) -> Result<Json<Stack>, ApiError> {
    Ok(Json(state.registry.get_stack(stack_id).await?))
}

/// `DELETE /stacks/{stack_id}`
///
/// # Errors
///
/// Returns 404 if the stack does not exist.
#[instrument(skip(state))]
pub async fn delete_stack(
    State(state): State<AppState>,
    ApiPath(stack_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    state.registry.delete_stack(stack_id).await?;
    state.locks.forget(stack_id);
    Ok(Json(json!({ "message": "Stack deleted" })))
}

/// `POST /stacks/{stack_id}/up`
///
/// # Errors
///
/// See [`run_verb`].
pub async fn up(
    state: State<AppState>,
    stack_id: ApiPath<i64>,
) -> Result<Json<ComposeOutput>, ApiError> {
    run_verb(state, stack_id, ComposeVerb::Up).await
}

/// `POST /stacks/{stack_id}/down`
///
/// # Errors
///
/// See [`run_verb`].
pub async fn down(
    state: State<AppState>,
    stack_id: ApiPath<i64>,
) -> Result<Json<ComposeOutput>, ApiError> {
    run_verb(state, stack_id, ComposeVerb::Down).await
}

/// `GET /stacks/{stack_id}/ps`
///
/// # Errors
///
/// See [`run_verb`].
pub async fn ps(
    state: State<AppState>,
    stack_id: ApiPath<i64>,
) -> Result<Json<ComposeOutput>, ApiError> {
    run_verb(state, stack_id, ComposeVerb::Ps).await
}

/// `POST /stacks/{stack_id}/restart`
///
/// # Errors
///
/// See [`run_verb`].
pub async fn restart(
    state: State<AppState>,
    stack_id: ApiPath<i64>,
) -> Result<Json<ComposeOutput>, ApiError> {
    run_verb(state, stack_id, ComposeVerb::Restart).await
}

/// Load the stack and its host, then run `verb`.
///
/// # Errors
///
/// Returns 404 for an unknown stack or host, 400 for API hosts or unusable
/// records, and 500 when the remote command fails.
#[instrument(skip(state))]
pub async fn run_verb(
    State(state): State<AppState>,
    ApiPath(stack_id): ApiPath<i64>,
    verb: ComposeVerb,
) -> Result<Json<ComposeOutput>, ApiError> {
    let stack = state.registry.get_stack(stack_id).await?;
    let host = state.registry.get_host(stack.host_id).await?;

    let unlocked = StackOperations::new(stack, host, state.dispatcher.clone())?;
    let ops = if state.serialize_operations {
        unlocked.with_lock(&state.locks)
    } else {
        unlocked
    };

    let output = ops.run(verb).await?;
    Ok(Json(ComposeOutput { output }))
}
