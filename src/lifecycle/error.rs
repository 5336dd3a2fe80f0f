//! Lifecycle-specific error types

use super::{LifecycleState, Phase};
use crate::error::MossError;
use thiserror::Error;

/// Errors that can occur during lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A single component's phase hook failed
    ///
    /// Never aborts sibling invocations and never reaches the host;
    /// it is recorded in the [`PhaseReport`](super::PhaseReport).
    #[error("{phase} failed for {component}: {source}")]
    ComponentPhaseFailure {
        /// Type name of the failing component
        component: String,
        /// The phase being run
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },

    /// The registry could not be built, so Load was aborted
    #[error("Registry build failed: {0}")]
    RegistryBuild(#[from] MossError),

    /// A listener could not be registered with the host
    #[error("Failed to register listener {listener} with {platform}: {source}")]
    HostRegistration {
        /// Type name of the listener component
        listener: String,
        /// Host platform name
        platform: String,
        #[source]
        source: anyhow::Error,
    },

    /// Unregistering a listener or cancelling a task failed
    #[error("Host cleanup failed ({action}): {source}")]
    HostCleanup {
        /// What was being cleaned up
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// The requested phase is not allowed from the current state
    #[error("Cannot {phase} while {state}")]
    InvalidTransition {
        /// The requested phase
        phase: Phase,
        /// State of the coordinator at the time
        state: LifecycleState,
    },
}

impl LifecycleError {
    /// Create a component failure error
    pub fn component_failed(
        component: impl Into<String>,
        phase: Phase,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::ComponentPhaseFailure {
            component: component.into(),
            phase,
            source: source.into(),
        }
    }

    /// Create a host registration failure error
    pub fn registration_failed(
        listener: impl Into<String>,
        platform: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::HostRegistration {
            listener: listener.into(),
            platform: platform.into(),
            source: source.into(),
        }
    }

    /// Create a host cleanup failure error
    pub fn cleanup_failed(action: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::HostCleanup {
            action: action.into(),
            source: source.into(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition(phase: Phase, state: LifecycleState) -> Self {
        Self::InvalidTransition { phase, state }
    }

    /// Whether the error only concerns one component or listener
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            Self::ComponentPhaseFailure { .. } | Self::HostRegistration { .. } | Self::HostCleanup { .. }
        )
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
