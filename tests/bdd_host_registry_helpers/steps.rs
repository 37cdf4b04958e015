//! Given/when steps for host registry scenarios.

use std::future::Future;

use dockhand::error::RegistryError;
use dockhand::registry::{ConnectionKind, DEFAULT_SSH_PORT, HostSpec, Registry, StackSpec};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{RegistryOutcome, RegistryState};

fn host_named(name: String, connection: ConnectionKind) -> HostSpec {
    HostSpec {
        name,
        connection,
        endpoint_url: None,
        address: None,
        ssh_user: None,
        ssh_key_path: None,
        ssh_port: DEFAULT_SSH_PORT,
        sudo_user: None,
        sudo_password: None,
    }
}

/// Run `scenario` against a fresh in-memory registry.
fn with_registry<F, Fut>(scenario: F) -> StepResult<RegistryOutcome>
where
    F: FnOnce(Registry) -> Fut,
    Fut: Future<Output = Result<RegistryOutcome, RegistryError>>,
{
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("failed to create runtime: {e}"))?;
    runtime.block_on(async {
        let registry = Registry::open_in_memory()
            .await
            .map_err(|e| format!("failed to open registry: {e}"))?;
        let outcome = scenario(registry.clone())
            .await
            .unwrap_or_else(|e| RegistryOutcome::Failed(e.to_string()));
        registry.close().await;
        Ok(outcome)
    })
}

#[given("a host named {name} reached over SSH")]
fn given_ssh_host(registry_state: &RegistryState, name: String) {
    let mut spec = host_named(name, ConnectionKind::Ssh);
    spec.address = Some(String::from("10.0.0.7"));
    spec.ssh_user = Some(String::from("deploy"));
    spec.ssh_key_path = Some(String::from("~/.ssh/id_ed25519"));
    spec.sudo_user = Some(String::from("root"));
    spec.sudo_password = Some(String::from("hunter2"));
    registry_state.host.set(spec);
}

#[given("a host named {name} reached over the engine API without an endpoint")]
fn given_incomplete_api_host(registry_state: &RegistryState, name: String) {
    registry_state
        .host
        .set(host_named(name, ConnectionKind::Api));
}

#[given("the host carries a stack with compose file {path}")]
fn given_stack(registry_state: &RegistryState, path: String) {
    registry_state.stack_file.set(path);
}

#[when("the host is registered and fetched back")]
fn when_registered_and_fetched(registry_state: &RegistryState) -> StepResult<()> {
    let spec = registry_state
        .host
        .get()
        .ok_or_else(|| String::from("host should be configured"))?;
    let outcome = with_registry(|registry| async move {
        let registered = registry.register_host(&spec).await?;
        let fetched = registry.get_host(registered.id).await?;
        Ok(RegistryOutcome::Fetched {
            registered,
            fetched,
        })
    })?;
    registry_state.outcome.set(outcome);
    Ok(())
}

#[when("the host is deleted")]
fn when_host_deleted(registry_state: &RegistryState) -> StepResult<()> {
    let spec = registry_state
        .host
        .get()
        .ok_or_else(|| String::from("host should be configured"))?;
    let stack_file = registry_state.stack_file.get();
    let outcome = with_registry(|registry| async move {
        let host = registry.register_host(&spec).await?;
        if let Some(compose_file) = stack_file {
            let stack = StackSpec {
                name: String::from("app"),
                compose_file,
            };
            registry.register_stack(host.id, &stack).await?;
        }
        let error = registry.delete_host(host.id).await.err().map(|e| match e {
            RegistryError::HostInUse { .. } => String::from("in use"),
            other => other.to_string(),
        });
        let still_present = registry.get_host(host.id).await.is_ok();
        Ok(RegistryOutcome::DeleteAttempted {
            error,
            still_present,
        })
    })?;
    registry_state.outcome.set(outcome);
    Ok(())
}

#[when("a stack is registered against host {host_id}")]
fn when_stack_registered(registry_state: &RegistryState, host_id: i64) -> StepResult<()> {
    let outcome = with_registry(|registry| async move {
        let stack = StackSpec {
            name: String::from("orphan"),
            compose_file: String::from("/srv/orphan/compose.yml"),
        };
        registry.register_stack(host_id, &stack).await?;
        Ok(RegistryOutcome::Failed(String::from(
            "stack was registered against a missing host",
        )))
    })?;
    registry_state.outcome.set(outcome);
    Ok(())
}
