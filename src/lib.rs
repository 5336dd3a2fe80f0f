//! # Moss
//!
//! Component lifecycle management for plugins hosted on game servers and proxies.
//!
//! Moss wires a plugin's components into a registry, drives them through the
//! host's load, enable, reload and disable callbacks, and keeps the host's
//! listener table in step with the live components.
//!
//! ## Features
//!
//! - **Registry**: Instance-scoped DI registry with automatic resolution and type-erased capability views
//! - **Lifecycle Phases**: `Loadable`, `Enableable`, `Disableable` and `Reloadable` hooks with per-component failure isolation
//! - **Reload Policies**: Rebuild the registry from scratch or reload the live components in place
//! - **Host Adapters**: Bind a coordinator to Paper, Velocity or BungeeCord style hosts
//! - **Modular Architecture**: Organize components with `#[module]` declarations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use moss::prelude::*;
//!
//! // 1. Define your components
//! #[derive(Component, Injectable)]
//! #[component(capabilities(Enableable, Disableable))]
//! pub struct ArenaService {
//!     info: Arc<CoordinatorInfo>,
//! }
//!
//! impl Enableable for ArenaService {
//!     fn on_enable(&self) -> anyhow::Result<()> {
//!         tracing::info!("Opening arenas for {}", self.info.plugin_name);
//!         Ok(())
//!     }
//! }
//!
//! impl Disableable for ArenaService {
//!     fn on_disable(&self) -> anyhow::Result<()> {
//!         tracing::info!("Closing arenas");
//!         Ok(())
//!     }
//! }
//!
//! // 2. Define your module
//! #[module(components = [ArenaService])]
//! pub struct ArenaModule;
//!
//! // 3. Drive it from the host callbacks
//! fn main() -> anyhow::Result<()> {
//!     let mut coordinator =
//!         LifecycleCoordinator::builder(CoordinatorConfig::for_platform("arena", Platform::Paper))
//!             .module::<ArenaModule>()
//!             .build();
//!
//!     coordinator.load()?;
//!     coordinator.enable()?;
//!     coordinator.reload()?;
//!     coordinator.disable();
//!     Ok(())
//! }
//! ```

extern crate self as moss;

pub mod config;
pub mod di;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod module;

// Re-export core types
pub use config::{ConfigService, CoordinatorConfig, ReloadPolicy};
pub use di::{Capabilities, Component, ComponentRef, Injectable, Registry, RegistryBuilder, RegistryId};
pub use error::{MossError, Result};
pub use host::{HostAdapter, HostPlatform, Platform, TaskId};
pub use lifecycle::{
    Disableable, Enableable, LifecycleCoordinator, LifecycleError, Loadable, Phase, PhaseReport,
    Reloadable,
};
pub use module::Module;

// Re-export macros
pub use moss_macro::{Component as DeriveComponent, Injectable as DeriveInjectable, module};

// Re-export commonly used types from dependencies
pub use anyhow;

/// Prelude module for convenient imports
///
/// ```
/// use moss::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, CoordinatorConfig, ReloadPolicy};
    pub use crate::di::{
        Capabilities, Component, ComponentRef, Injectable, Registry, RegistryBuilder, RegistryId,
    };
    pub use crate::error::{MossError, Result};
    pub use crate::host::{DisableReport, EnableReport, HostAdapter, HostPlatform, Platform, TaskId};
    pub use crate::lifecycle::{
        CoordinatorBuilder, CoordinatorInfo, Disableable, Enableable, LifecycleCoordinator,
        LifecycleError, LifecycleState, Loadable, Phase, PhaseReport, Reloadable,
    };
    pub use crate::module::Module;
    pub use crate::{DeriveComponent as Component, DeriveInjectable as Injectable, module};
    pub use std::sync::Arc;
}
