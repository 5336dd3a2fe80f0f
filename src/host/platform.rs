use crate::config::ReloadPolicy;
use crate::di::Component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

/// Identifier of a task scheduled on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// The host runtimes a plugin can be bound to
///
/// Each platform carries the lifecycle policies its adapter has always used.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Paper game server
    Paper,
    /// Velocity proxy
    Velocity,
    /// BungeeCord proxy
    BungeeCord,
}

impl Platform {
    pub fn reload_policy(self) -> ReloadPolicy {
        match self {
            Platform::Paper | Platform::Velocity => ReloadPolicy::Rebuild,
            Platform::BungeeCord => ReloadPolicy::InPlace,
        }
    }

    /// BungeeCord runs an initial in-place reload right after enabling.
    pub fn reload_on_enable(self) -> bool {
        matches!(self, Platform::BungeeCord)
    }
}

/// The host-side API a [`HostAdapter`](super::HostAdapter) drives
///
/// Implementations wrap the host's server or proxy handle. The adapter
/// bootstraps the implementation into every registry it builds, so
/// components can inject it like any other component.
///
/// `Listener` is the platform-native listener capability. Components expose
/// it from [`Component::capabilities`] and the adapter registers them with
/// the host after the Enable phase.
pub trait HostPlatform: Component {
    /// Listener capability understood by this host
    type Listener: ?Sized + Send + Sync + 'static;

    /// Name of the host for log lines
    fn name(&self) -> String;

    /// Register a listener on behalf of `plugin`
    fn register_listener(&self, plugin: &str, listener: Arc<Self::Listener>) -> anyhow::Result<()>;

    /// Unregister a listener previously handed to `register_listener`
    fn unregister_listener(&self, plugin: &str, listener: &Arc<Self::Listener>) -> anyhow::Result<()>;

    /// Tasks currently scheduled by `plugin`
    fn scheduled_tasks(&self, plugin: &str) -> Vec<TaskId>;

    fn cancel_task(&self, task: TaskId) -> anyhow::Result<()>;
}
