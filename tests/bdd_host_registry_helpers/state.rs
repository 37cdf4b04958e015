//! Scenario state for host registry behavioural tests.

use dockhand::registry::{Host, HostSpec};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// What a registry interaction produced.
#[derive(Debug, Clone)]
pub(crate) enum RegistryOutcome {
    /// The host was stored and read back.
    Fetched {
        registered: Host,
        fetched: Host,
    },
    /// The host deletion was attempted; `still_present` reflects a
    /// follow-up lookup.
    DeleteAttempted {
        error: Option<String>,
        still_present: bool,
    },
    /// A registry call failed.
    Failed(String),
}

#[derive(Default, ScenarioState)]
pub(crate) struct RegistryState {
    pub(crate) host: Slot<HostSpec>,
    pub(crate) stack_file: Slot<String>,
    pub(crate) outcome: Slot<RegistryOutcome>,
}

#[fixture]
pub(crate) fn registry_state() -> RegistryState {
    RegistryState::default()
}
