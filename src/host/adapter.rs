//! Host Adapter
//!
//! Translates host lifecycle callbacks into coordinator transitions and
//! keeps the host's listener table in step with the live registry.

use super::HostPlatform;
use crate::config::ReloadPolicy;
use crate::di::ComponentRef;
use crate::lifecycle::{
    CoordinatorBuilder, LifecycleCoordinator, LifecycleError, Phase, PhaseReport, Result,
};
use std::sync::Arc;

/// Outcome of [`HostAdapter::on_enable`]
#[derive(Debug, Default)]
pub struct EnableReport {
    /// The Enable phase, followed by the initial Reload phase when configured
    pub phases: Vec<PhaseReport>,
    pub listeners_registered: usize,
    pub listener_failures: Vec<LifecycleError>,
}

impl EnableReport {
    pub fn is_clean(&self) -> bool {
        self.listener_failures.is_empty() && self.phases.iter().all(PhaseReport::is_clean)
    }
}

/// Outcome of [`HostAdapter::on_disable`]
#[derive(Debug, Default)]
pub struct DisableReport {
    /// The Disable phase, `None` when nothing was loaded
    pub phase: Option<PhaseReport>,
    pub listeners_unregistered: usize,
    pub tasks_cancelled: usize,
    pub cleanup_failures: Vec<LifecycleError>,
}

impl DisableReport {
    pub fn is_clean(&self) -> bool {
        self.cleanup_failures.is_empty() && self.phase.as_ref().is_none_or(PhaseReport::is_clean)
    }
}

/// Binds a [`LifecycleCoordinator`] to one host platform
///
/// The host handle is bootstrapped into every registry. Host callbacks map
/// onto the coordinator as follows:
///
/// | Host callback | Adapter                        | Afterwards                                  |
/// |---------------|--------------------------------|---------------------------------------------|
/// | load          | [`on_load`](Self::on_load)     |                                             |
/// | enable        | [`on_enable`](Self::on_enable) | every `P::Listener` registered with the host |
/// | disable       | [`on_disable`](Self::on_disable) | listeners unregistered, tasks cancelled, registry closed |
///
/// Listener registration and cleanup are best-effort: each failure is
/// logged and reported, and the remaining listeners and tasks are still
/// processed.
///
/// # Example
///
/// ```rust,ignore
/// let config = CoordinatorConfig::for_platform("lobby", Platform::Velocity);
/// let mut adapter = HostAdapter::new(
///     Arc::new(VelocityProxy::new(server)),
///     LifecycleCoordinator::builder(config).module::<AppModule>(),
/// );
///
/// adapter.on_load()?;    // proxy constructed the plugin
/// adapter.on_enable()?;  // ProxyInitializeEvent
/// adapter.on_disable();  // ProxyShutdownEvent
/// ```
pub struct HostAdapter<P: HostPlatform> {
    host: Arc<P>,
    coordinator: LifecycleCoordinator,
    listeners: Vec<ComponentRef<P::Listener>>,
}

impl<P: HostPlatform> HostAdapter<P> {
    pub fn new(host: Arc<P>, coordinator: CoordinatorBuilder) -> Self {
        let coordinator = coordinator.bootstrap_arc(Arc::clone(&host)).build();
        Self {
            host,
            coordinator,
            listeners: Vec::new(),
        }
    }

    pub fn host(&self) -> &Arc<P> {
        &self.host
    }

    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    /// Listeners handed to the host since the last enable, whether or not
    /// the host accepted them
    pub fn tracked_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Host "load" callback
    ///
    /// A plugin that is still loaded is disabled first, listeners included.
    pub fn on_load(&mut self) -> Result<PhaseReport> {
        if self.coordinator.is_loaded() {
            tracing::warn!(
                "{} received load while {}; disabling first",
                self.coordinator.name(),
                self.coordinator.state()
            );
            self.on_disable();
        }
        self.coordinator.load()
    }

    /// Host "enable" callback
    pub fn on_enable(&mut self) -> Result<EnableReport> {
        let mut report = EnableReport {
            phases: vec![self.coordinator.enable()?],
            ..EnableReport::default()
        };

        if self.coordinator.config().reload_on_enable {
            report.phases.push(self.coordinator.reload_in_place()?);
        }

        self.register_listeners(&mut report);
        Ok(report)
    }

    /// Host "disable" callback
    pub fn on_disable(&mut self) -> DisableReport {
        let host = Arc::clone(&self.host);
        let plugin = self.coordinator.name().to_string();
        let listeners = std::mem::take(&mut self.listeners);

        let mut report = DisableReport::default();
        let phase = self.coordinator.disable_with(|_| {
            unregister_listeners(host.as_ref(), &plugin, &listeners, &mut report);
            cancel_tasks_of(host.as_ref(), &plugin, &mut report);
        });
        report.phase = phase;
        report
    }

    /// Reload according to the configured [`ReloadPolicy`]
    ///
    /// `Rebuild` runs the full disable, load and enable callbacks, so
    /// listeners are re-registered against the new instances. `InPlace`
    /// leaves the host untouched. Both fail while unloaded.
    pub fn reload(&mut self) -> Result<Vec<PhaseReport>> {
        if !self.coordinator.is_loaded() {
            return Err(LifecycleError::invalid_transition(
                Phase::Reload,
                self.coordinator.state(),
            ));
        }

        match self.coordinator.config().reload_policy {
            ReloadPolicy::Rebuild => {
                let mut phases = Vec::with_capacity(3);
                phases.extend(self.on_disable().phase);
                phases.push(self.on_load()?);
                phases.extend(self.on_enable()?.phases);
                Ok(phases)
            }
            ReloadPolicy::InPlace => self.coordinator.reload(),
        }
    }

    fn register_listeners(&mut self, report: &mut EnableReport) {
        let plugin = self.coordinator.name().to_string();
        let platform = self.host.name();

        for listener in self.coordinator.components_of::<P::Listener>() {
            match self
                .host
                .register_listener(&plugin, Arc::clone(listener.instance()))
            {
                Ok(()) => {
                    tracing::debug!("Registered listener {} with {}", listener.name(), platform);
                    report.listeners_registered += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to register listener {}: {:#}", listener.name(), e);
                    report.listener_failures.push(LifecycleError::registration_failed(
                        listener.type_name(),
                        platform.as_str(),
                        e,
                    ));
                }
            }
            self.listeners.push(listener);
        }

        tracing::info!(
            "Registered {}/{} listeners of {} with {}",
            report.listeners_registered,
            self.listeners.len(),
            plugin,
            platform
        );
    }
}

fn unregister_listeners<P: HostPlatform>(
    host: &P,
    plugin: &str,
    listeners: &[ComponentRef<P::Listener>],
    report: &mut DisableReport,
) {
    for listener in listeners {
        match host.unregister_listener(plugin, listener.instance()) {
            Ok(()) => report.listeners_unregistered += 1,
            Err(e) => {
                tracing::warn!("Failed to unregister listener {}: {:#}", listener.name(), e);
                report.cleanup_failures.push(LifecycleError::cleanup_failed(
                    format!("unregister {}", listener.name()),
                    e,
                ));
            }
        }
    }
}

fn cancel_tasks_of<P: HostPlatform>(host: &P, plugin: &str, report: &mut DisableReport) {
    for task in host.scheduled_tasks(plugin) {
        match host.cancel_task(task) {
            Ok(()) => report.tasks_cancelled += 1,
            Err(e) => {
                tracing::warn!("Failed to cancel {} of {}: {:#}", task, plugin, e);
                report
                    .cleanup_failures
                    .push(LifecycleError::cleanup_failed(format!("cancel {}", task), e));
            }
        }
    }
}
