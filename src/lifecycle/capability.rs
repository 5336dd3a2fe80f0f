//! Capability markers
//!
//! A component opts into a lifecycle phase by implementing the matching
//! trait and exposing it from [`Component::capabilities`](crate::di::Component::capabilities).
//! The traits are independent of each other: a component is the union of
//! whichever capabilities it declares.

use crate::di::Registry;

/// Called once per registry lifetime, after every component is wired
///
/// Use this hook to:
/// - Read configuration files
/// - Look up sibling components from the live registry
/// - Prepare state that must exist before the host enables the plugin
///
/// # Example
///
/// ```rust,ignore
/// use moss::prelude::*;
///
/// impl Loadable for MessagesConfig {
///     fn on_load(&self, registry: &Registry) -> anyhow::Result<()> {
///         let plugin = registry.resolve::<CoordinatorInfo>()?;
///         self.read_from(&plugin.plugin_name)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Loadable: Send + Sync {
    /// Called when the registry has been built
    fn on_load(&self, registry: &Registry) -> anyhow::Result<()>;
}

/// Called when the host enables the plugin
///
/// Use this hook to:
/// - Start repeating tasks
/// - Open connections that need the host to be ready
///
/// Host listeners are registered by the host adapter after every
/// `on_enable` has run.
pub trait Enableable: Send + Sync {
    /// Called when the plugin is being enabled
    fn on_enable(&self) -> anyhow::Result<()>;
}

/// Called when the host disables the plugin
///
/// Runs at most once per registry lifetime, before host listeners are
/// unregistered and before the registry is closed.
///
/// # Example
///
/// ```rust,ignore
/// use moss::prelude::*;
///
/// impl Disableable for StatsFlusher {
///     fn on_disable(&self) -> anyhow::Result<()> {
///         self.flush()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Disableable: Send + Sync {
    /// Called when the plugin is being disabled
    fn on_disable(&self) -> anyhow::Result<()>;
}

/// Called by an in-place reload
///
/// Components keep their identity and state; only this hook runs.
pub trait Reloadable: Send + Sync {
    /// Called when the plugin is reloaded without rebuilding the registry
    fn on_reload(&self) -> anyhow::Result<()>;
}
