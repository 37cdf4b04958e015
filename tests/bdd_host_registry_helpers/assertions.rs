//! Assertion helpers for host registry behavioural tests.

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{RegistryOutcome, RegistryState};

fn outcome(registry_state: &RegistryState) -> StepResult<RegistryOutcome> {
    registry_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

#[then("the fetched host matches the registered host")]
fn fetched_matches(registry_state: &RegistryState) -> StepResult<()> {
    let spec = registry_state
        .host
        .get()
        .ok_or_else(|| String::from("host should be configured"))?;
    match outcome(registry_state)? {
        RegistryOutcome::Fetched {
            registered,
            fetched,
        } if fetched == registered && fetched.spec == spec => Ok(()),
        other => Err(format!("expected an unchanged host, got {other:?}")),
    }
}

#[then("the deletion is rejected because the host is in use")]
fn deletion_rejected(registry_state: &RegistryState) -> StepResult<()> {
    match outcome(registry_state)? {
        RegistryOutcome::DeleteAttempted { error: Some(e), .. } if e == "in use" => Ok(()),
        other => Err(format!("expected HostInUse, got {other:?}")),
    }
}

#[then("the host is still registered")]
fn host_still_registered(registry_state: &RegistryState) -> StepResult<()> {
    match outcome(registry_state)? {
        RegistryOutcome::DeleteAttempted {
            still_present: true,
            ..
        } => Ok(()),
        other => Err(format!("expected the host to remain, got {other:?}")),
    }
}

#[then("the registration fails because host {host_id} was not found")]
fn registration_not_found(registry_state: &RegistryState, host_id: i64) -> StepResult<()> {
    let expected = format!("Host not found: {host_id}");
    match outcome(registry_state)? {
        RegistryOutcome::Failed(msg) if msg == expected => Ok(()),
        other => Err(format!("expected `{expected}`, got {other:?}")),
    }
}
