//! Given/when steps for stack operation scenarios.

use std::sync::Arc;

use dockhand::backend::{DaemonConnector, RemoteShell};
use dockhand::dispatch::{ComposeVerb, Dispatcher, Timeouts};
use dockhand::error::DispatchError;
use dockhand::registry::{ConnectionKind, Host, Stack, StackSpec};
use dockhand::stack::StackOperations;
use mockable::DefaultEnv;
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{FailureKind, StackOutcome, StackState, blank_host};

const HOST_ID: i64 = 1;
const STACK_ID: i64 = 10;

#[given("an SSH host for user {user} with key {key}")]
fn given_ssh_host(stack_state: &StackState, user: String, key: String) {
    let mut spec = blank_host(ConnectionKind::Ssh);
    spec.address = Some(String::from("10.0.0.7"));
    spec.ssh_user = Some(user);
    spec.ssh_key_path = Some(key);
    stack_state.host.set(spec);
}

#[given("an API host at {endpoint}")]
fn given_api_host(stack_state: &StackState, endpoint: String) {
    let mut spec = blank_host(ConnectionKind::Api);
    spec.endpoint_url = Some(endpoint);
    stack_state.host.set(spec);
}

#[given("the host switches to sudo user {user}")]
fn given_sudo_user(stack_state: &StackState, user: String) -> StepResult<()> {
    let mut spec = stack_state
        .host
        .get()
        .ok_or_else(|| String::from("host should be configured first"))?;
    spec.sudo_user = Some(user);
    stack_state.host.set(spec);
    Ok(())
}

#[given("a stack with compose file {path}")]
fn given_stack(stack_state: &StackState, path: String) {
    stack_state.compose_file.set(path);
}

#[given("the remote command fails with stderr {stderr}")]
fn given_remote_failure(stack_state: &StackState, stderr: String) -> StepResult<()> {
    stack_state
        .shell
        .get()
        .ok_or_else(|| String::from("shell should be configured"))?
        .fail_with(&stderr);
    Ok(())
}

#[when("the {verb} verb is run")]
fn when_verb_is_run(stack_state: &StackState, verb: String) -> StepResult<()> {
    let parsed = parse_verb(&verb)?;
    run_verbs(stack_state, &[parsed])
}

#[when("every verb is run in turn")]
fn when_every_verb_is_run(stack_state: &StackState) -> StepResult<()> {
    run_verbs(stack_state, &ComposeVerb::ALL)
}

fn parse_verb(verb: &str) -> StepResult<ComposeVerb> {
    match verb {
        "up" => Ok(ComposeVerb::Up),
        "down" => Ok(ComposeVerb::Down),
        "ps" => Ok(ComposeVerb::Ps),
        "restart" => Ok(ComposeVerb::Restart),
        other => Err(format!("unknown verb: {other}")),
    }
}

fn bind(stack_state: &StackState) -> StepResult<Result<StackOperations, DispatchError>> {
    let spec = stack_state
        .host
        .get()
        .ok_or_else(|| String::from("host should be configured"))?;
    let compose_file = stack_state
        .compose_file
        .get()
        .ok_or_else(|| String::from("stack should be configured"))?;
    let shell = stack_state
        .shell
        .get()
        .ok_or_else(|| String::from("shell should be configured"))?;
    let connector = stack_state
        .connector
        .get()
        .ok_or_else(|| String::from("connector should be configured"))?;

    let dispatcher = Dispatcher::new(
        shell as Arc<dyn RemoteShell>,
        connector as Arc<dyn DaemonConnector>,
        DefaultEnv::new(),
        Timeouts::default(),
    );
    let host = Host { id: HOST_ID, spec };
    let stack = Stack {
        id: STACK_ID,
        host_id: HOST_ID,
        spec: StackSpec {
            name: String::from("scenario-stack"),
            compose_file,
        },
    };
    Ok(StackOperations::new(stack, host, dispatcher))
}

fn run_verbs(stack_state: &StackState, verbs: &[ComposeVerb]) -> StepResult<()> {
    let ops = match bind(stack_state)? {
        Ok(ops) => ops,
        Err(e) => {
            stack_state
                .outcome
                .set(StackOutcome::Failed(FailureKind::from(&e), e.to_string()));
            return Ok(());
        }
    };

    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("failed to create runtime: {e}"))?;
    let result: Result<Vec<String>, DispatchError> = runtime.block_on(async {
        let mut outputs = Vec::with_capacity(verbs.len());
        for verb in verbs {
            outputs.push(ops.run(*verb).await?);
        }
        Ok(outputs)
    });

    let outcome = match result {
        Ok(outputs) => StackOutcome::Succeeded(outputs),
        Err(e) => StackOutcome::Failed(FailureKind::from(&e), e.to_string()),
    };
    stack_state.outcome.set(outcome);
    Ok(())
}
