//! Lifecycle Coordinator
//!
//! Owns the registry of one plugin instance and drives it through
//! Load, Enable, Disable and Reload.

use super::{
    Disableable, Enableable, LifecycleError, LifecycleState, Loadable, Phase, PhaseInvoker,
    PhaseReport, Reloadable, Result,
};
use crate::config::{CoordinatorConfig, ReloadPolicy};
use crate::di::{Component, ComponentRef, Registry, RegistryBuilder};
use crate::error::MossError;
use crate::host::Platform;
use crate::module::Module;
use std::sync::Arc;

type BootstrapFn = Box<dyn Fn(&mut RegistryBuilder) + Send>;
type ModuleFn = fn(&mut RegistryBuilder) -> crate::Result<()>;

/// The coordinator's own bootstrap component
///
/// Registered first in every registry, so components can find out which
/// plugin they belong to and which registry generation they live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorInfo {
    pub plugin_name: String,
    pub platform: Option<Platform>,
    pub reload_policy: ReloadPolicy,
    /// Number of successful loads, this one included
    pub generation: u64,
}

impl Component for CoordinatorInfo {}

/// Drives one registry through the lifecycle phases
///
/// ```text
/// Unloaded --load--> Loaded --enable--> Enabled
///    ^                  |                  |
///    +-----disable------+------disable-----+
/// ```
///
/// Every phase is a synchronous sweep over the components exposing the
/// matching capability, run by a [`PhaseInvoker`]. Component failures are
/// logged and returned in the [`PhaseReport`], never propagated. Only a
/// failure to build the registry aborts a transition.
///
/// Calling [`load`](Self::load) while a registry is live disables it first.
/// The coordinator does not synchronize: callers delivering host callbacks
/// from several threads must serialize them.
///
/// # Example
///
/// ```rust,ignore
/// use moss::prelude::*;
///
/// let mut coordinator = LifecycleCoordinator::builder(CoordinatorConfig::new("lobby"))
///     .bootstrap(ServerHandle::current())
///     .module::<AppModule>()
///     .build();
///
/// coordinator.load()?;
/// coordinator.enable()?;
/// // ... host runs ...
/// coordinator.disable();
/// ```
pub struct LifecycleCoordinator {
    config: CoordinatorConfig,
    bootstrap: Vec<BootstrapFn>,
    modules: Vec<(&'static str, ModuleFn)>,
    registry: Option<Arc<Registry>>,
    state: LifecycleState,
    generation: u64,
}

impl LifecycleCoordinator {
    /// Create a new coordinator builder
    pub fn builder(config: CoordinatorConfig) -> CoordinatorBuilder {
        CoordinatorBuilder::new(config)
    }

    pub fn name(&self) -> &str {
        &self.config.plugin_name
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The live registry, `None` while unloaded
    pub fn registry(&self) -> Option<Arc<Registry>> {
        self.registry.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state != LifecycleState::Unloaded
    }

    pub fn is_enabled(&self) -> bool {
        self.state == LifecycleState::Enabled
    }

    /// Number of registries built so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Components of the live registry exposing `C`; empty while unloaded
    pub fn components_of<C: ?Sized + Send + Sync + 'static>(&self) -> Vec<ComponentRef<C>> {
        self.registry
            .as_ref()
            .map(|registry| registry.components_of::<C>())
            .unwrap_or_default()
    }

    /// Build a new registry and run every `Loadable::on_load`
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::RegistryBuild`] if the registry cannot be
    /// built; no hook has run and the coordinator stays unloaded.
    pub fn load(&mut self) -> Result<PhaseReport> {
        if self.state != LifecycleState::Unloaded {
            tracing::warn!(
                "{} is already {}; disabling before loading again",
                self.name(),
                self.state
            );
            self.disable();
        }

        tracing::info!("Loading {}...", self.name());

        let generation = self.generation + 1;
        let registry = self.build_registry(generation).map_err(|e| {
            tracing::error!("Failed to build registry for {}: {}", self.name(), e);
            LifecycleError::RegistryBuild(e)
        })?;
        let registry = Arc::new(registry);

        let report = PhaseInvoker::new(&registry, Phase::Load).invoke_with::<dyn Loadable, _, _>(
            |loadable| loadable.on_load(&registry),
            |loadable, e| tracing::error!("Failed to load {}: {}", loadable.name(), e),
        );

        self.generation = generation;
        self.registry = Some(registry);
        self.state = LifecycleState::Loaded;

        tracing::info!(
            "Loaded {} ({} components, {} loadables, {} failed)",
            self.name(),
            self.registry.as_ref().map_or(0, |r| r.len()),
            report.invoked(),
            report.failure_count()
        );
        Ok(report)
    }

    /// Run every `Enableable::on_enable`
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] unless the coordinator
    /// is `Loaded`.
    pub fn enable(&mut self) -> Result<PhaseReport> {
        let registry = match (self.state, &self.registry) {
            (LifecycleState::Loaded, Some(registry)) => Arc::clone(registry),
            _ => return Err(LifecycleError::invalid_transition(Phase::Enable, self.state)),
        };

        tracing::info!("Enabling {}...", self.name());

        let report = PhaseInvoker::new(&registry, Phase::Enable)
            .invoke_with::<dyn Enableable, _, _>(
                |enableable| enableable.on_enable(),
                |enableable, e| {
                    tracing::error!("An error occurred while enabling {}: {}", enableable.name(), e)
                },
            );

        self.state = LifecycleState::Enabled;

        tracing::info!(
            "Enabled {} ({} enableables, {} failed)",
            self.name(),
            report.invoked(),
            report.failure_count()
        );
        Ok(report)
    }

    /// Run every `Disableable::on_disable` and close the registry
    ///
    /// Returns `None` when nothing was loaded.
    pub fn disable(&mut self) -> Option<PhaseReport> {
        self.disable_with(|_| {})
    }

    /// Like [`disable`](Self::disable), running `before_close` after the
    /// Disable phase and before the registry is closed
    pub fn disable_with<F>(&mut self, before_close: F) -> Option<PhaseReport>
    where
        F: FnOnce(&Registry),
    {
        let Some(registry) = self.registry.take() else {
            tracing::debug!("Disable requested for {} while unloaded", self.name());
            return None;
        };

        tracing::info!("Disabling {}...", self.name());

        let report = PhaseInvoker::new(&registry, Phase::Disable)
            .invoke_with::<dyn Disableable, _, _>(
                |disableable| disableable.on_disable(),
                |disableable, e| {
                    tracing::error!(
                        "An error occurred while disabling {}: {}",
                        disableable.name(),
                        e
                    )
                },
            );

        before_close(&registry);
        registry.close();
        self.state = LifecycleState::Unloaded;

        tracing::info!(
            "Disabled {} ({} disableables, {} failed)",
            self.name(),
            report.invoked(),
            report.failure_count()
        );
        Some(report)
    }

    /// Reload according to the configured [`ReloadPolicy`]
    ///
    /// Returns the reports of every phase that ran.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] while unloaded, under
    /// either policy.
    pub fn reload(&mut self) -> Result<Vec<PhaseReport>> {
        if !self.is_loaded() {
            return Err(LifecycleError::invalid_transition(Phase::Reload, self.state));
        }

        match self.config.reload_policy {
            ReloadPolicy::Rebuild => {
                tracing::info!("Rebuilding {}...", self.name());
                let mut reports = Vec::with_capacity(3);
                reports.extend(self.disable());
                reports.push(self.load()?);
                reports.push(self.enable()?);
                Ok(reports)
            }
            ReloadPolicy::InPlace => Ok(vec![self.reload_in_place()?]),
        }
    }

    /// Run every `Reloadable::on_reload` on the live components
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] while unloaded.
    pub fn reload_in_place(&mut self) -> Result<PhaseReport> {
        let Some(registry) = self.registry.clone() else {
            return Err(LifecycleError::invalid_transition(Phase::Reload, self.state));
        };

        tracing::info!("Reloading {}...", self.name());

        let report = PhaseInvoker::new(&registry, Phase::Reload)
            .invoke_with::<dyn Reloadable, _, _>(
                |reloadable| reloadable.on_reload(),
                |reloadable, e| tracing::error!("Failed to reload {}: {}", reloadable.name(), e),
            );

        tracing::info!(
            "Reloaded {} ({} reloadables, {} failed)",
            self.name(),
            report.invoked(),
            report.failure_count()
        );
        Ok(report)
    }

    fn build_registry(&self, generation: u64) -> crate::Result<Registry> {
        let mut builder = RegistryBuilder::new();
        builder.instance(CoordinatorInfo {
            plugin_name: self.config.plugin_name.clone(),
            platform: self.config.platform,
            reload_policy: self.config.reload_policy,
            generation,
        });

        for bootstrap in &self.bootstrap {
            bootstrap(&mut builder);
        }

        for (name, register) in &self.modules {
            register(&mut builder).map_err(|e| MossError::ModuleRegistrationFailed {
                message: format!("{}: {}", name, e),
            })?;
        }

        builder.build()
    }
}

/// Builder for [`LifecycleCoordinator`]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    bootstrap: Vec<BootstrapFn>,
    modules: Vec<(&'static str, ModuleFn)>,
}

impl CoordinatorBuilder {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            bootstrap: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a module whose components are discovered on every load
    pub fn module<M: Module>(mut self) -> Self {
        self.modules
            .push((std::any::type_name::<M>(), M::register as ModuleFn));
        self
    }

    /// Bootstrap a singleton shared by every registry this coordinator builds
    pub fn bootstrap<T: Component>(self, instance: T) -> Self {
        self.bootstrap_arc(Arc::new(instance))
    }

    pub fn bootstrap_arc<T: Component>(mut self, instance: Arc<T>) -> Self {
        self.bootstrap.push(Box::new(move |builder| {
            builder.arc(Arc::clone(&instance));
        }));
        self
    }

    /// Run custom registrations before module discovery, on every load
    pub fn bootstrap_with<F>(mut self, register: F) -> Self
    where
        F: Fn(&mut RegistryBuilder) + Send + 'static,
    {
        self.bootstrap.push(Box::new(register));
        self
    }

    pub fn build(self) -> LifecycleCoordinator {
        LifecycleCoordinator {
            config: self.config,
            bootstrap: self.bootstrap,
            modules: self.modules,
            registry: None,
            state: LifecycleState::Unloaded,
            generation: 0,
        }
    }
}
