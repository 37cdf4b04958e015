//! Assertion helpers for stack operation behavioural tests.

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{FailureKind, IssuedCommand, StackOutcome, StackState};

fn outcome(stack_state: &StackState) -> StepResult<StackOutcome> {
    stack_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

fn issued(stack_state: &StackState) -> StepResult<Vec<IssuedCommand>> {
    Ok(stack_state
        .shell
        .get()
        .ok_or_else(|| String::from("shell should be configured"))?
        .issued())
}

fn single_issued(stack_state: &StackState) -> StepResult<IssuedCommand> {
    let mut commands = issued(stack_state)?;
    match (commands.pop(), commands.is_empty()) {
        (Some(only), true) => Ok(only),
        (None, _) => Err(String::from("no remote command was issued")),
        (Some(_), false) => Err(format!("expected one command, got {}", commands.len() + 1)),
    }
}

#[then("the stack operation succeeds")]
fn operation_succeeds(stack_state: &StackState) -> StepResult<()> {
    match outcome(stack_state)? {
        StackOutcome::Succeeded(outputs) if outputs.iter().all(|o| o == "done") => Ok(()),
        StackOutcome::Succeeded(outputs) => Err(format!("unexpected output: {outputs:?}")),
        StackOutcome::Failed(kind, msg) => Err(format!("expected success, got {kind:?}: {msg}")),
    }
}

#[then("the stack operation is refused as unsupported")]
fn operation_is_unsupported(stack_state: &StackState) -> StepResult<()> {
    match outcome(stack_state)? {
        StackOutcome::Failed(FailureKind::Unsupported, _) => Ok(()),
        other => Err(format!("expected BackendUnsupported, got {other:?}")),
    }
}

#[then("the stack operation fails with a remote error mentioning {text}")]
fn operation_fails_remotely(stack_state: &StackState, text: String) -> StepResult<()> {
    match outcome(stack_state)? {
        StackOutcome::Failed(FailureKind::Remote, msg) if msg.contains(&text) => Ok(()),
        other => Err(format!("expected remote failure mentioning {text}, got {other:?}")),
    }
}

#[then("exactly one remote command was issued: {command}")]
fn exactly_one_command(stack_state: &StackState, command: String) -> StepResult<()> {
    let only = single_issued(stack_state)?;
    if only.command == command {
        Ok(())
    } else {
        Err(format!("expected `{command}`, got `{}`", only.command))
    }
}

#[then("every remote command starts with: {prefix}")]
fn every_command_has_prefix(stack_state: &StackState, prefix: String) -> StepResult<()> {
    let commands = issued(stack_state)?;
    if commands.len() != 4 {
        return Err(format!("expected four commands, got {}", commands.len()));
    }
    commands
        .iter()
        .find(|issued_command| !issued_command.command.starts_with(&prefix))
        .map_or(Ok(()), |stray| {
            Err(format!("`{}` does not start with `{prefix}`", stray.command))
        })
}

#[then("no remote command was issued")]
fn no_command_issued(stack_state: &StackState) -> StepResult<()> {
    let commands = issued(stack_state)?;
    if commands.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no commands, got {}", commands.len()))
    }
}

#[then("the daemon connector was never used")]
fn connector_unused(stack_state: &StackState) -> StepResult<()> {
    let connects = stack_state
        .connector
        .get()
        .ok_or_else(|| String::from("connector should be configured"))?
        .connects();
    if connects == 0 {
        Ok(())
    } else {
        Err(format!("expected zero connects, got {connects}"))
    }
}

#[then("the remote command ran as sudo user {user}")]
fn ran_as_sudo_user(stack_state: &StackState, user: String) -> StepResult<()> {
    match single_issued(stack_state)?.sudo {
        Some(identity) if identity.user == user => Ok(()),
        other => Err(format!("expected sudo user {user}, got {other:?}")),
    }
}

#[then("the remote command ran without sudo")]
fn ran_without_sudo(stack_state: &StackState) -> StepResult<()> {
    match single_issued(stack_state)?.sudo {
        None => Ok(()),
        Some(identity) => Err(format!("expected no sudo, got {}", identity.user)),
    }
}
