use super::LifecycleError;
use crate::di::RegistryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumIter, EnumString};

/// A coordinated sweep over every component exposing the matching capability
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Load,
    Enable,
    Disable,
    Reload,
}

/// Coordinator state. Disabling returns to `Unloaded`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Unloaded,
    Loaded,
    Enabled,
}

/// Result of invoking one component during a phase
#[derive(Debug)]
pub struct ComponentOutcome {
    /// Fully qualified type name of the component
    pub component: &'static str,
    pub result: std::result::Result<(), LifecycleError>,
}

impl ComponentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-component outcomes of one phase, in invocation order
#[derive(Debug)]
pub struct PhaseReport {
    phase: Phase,
    registry: RegistryId,
    started_at: DateTime<Utc>,
    elapsed: Duration,
    outcomes: Vec<ComponentOutcome>,
}

impl PhaseReport {
    pub(crate) fn new(
        phase: Phase,
        registry: RegistryId,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        outcomes: Vec<ComponentOutcome>,
    ) -> Self {
        Self {
            phase,
            registry,
            started_at,
            elapsed,
            outcomes,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Registry the phase ran against
    pub fn registry(&self) -> RegistryId {
        self.registry
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn outcomes(&self) -> &[ComponentOutcome] {
        &self.outcomes
    }

    /// Number of components invoked
    pub fn invoked(&self) -> usize {
        self.outcomes.len()
    }

    /// Type names of invoked components, in invocation order
    pub fn invoked_components(&self) -> Vec<&'static str> {
        self.outcomes.iter().map(|o| o.component).collect()
    }

    pub fn succeeded(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.component)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &LifecycleError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.component, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Whether every invoked component succeeded
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}
