//! Lifecycle Module
//!
//! This module binds a [`Registry`](crate::di::Registry) to the phase
//! transitions of a host application.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Host load callback
//!    ↓
//! 2. Registry creation (bootstrap singletons + module discovery)
//!    ↓
//! 3. Wiring (every component instantiated)
//!    ↓
//! 4. Loadable::on_load (each component)      ← Load phase
//!    ↓
//! 5. Host enable callback
//!    ↓
//! 6. Enableable::on_enable (each component)  ← Enable phase
//!    ↓
//! 7. Host listeners registered (host adapter)
//!    ↓
//! [Running...]   Reloadable::on_reload       ← Reload phase (in place)
//!    ↓
//! 8. Host disable callback
//!    ↓
//! 9. Disableable::on_disable (each component) ← Disable phase
//!    ↓
//! 10. Host listeners unregistered, tasks cancelled
//!    ↓
//! 11. Registry closed
//! ```
//!
//! A failing component never stops the phase: its error is logged and
//! recorded in the [`PhaseReport`]. Only a registry that cannot be built
//! aborts a transition.
//!
//! # Example
//!
//! ```rust,ignore
//! use moss::prelude::*;
//!
//! #[derive(Component, Injectable)]
//! #[component(capabilities(Loadable, Disableable))]
//! pub struct StatsService {
//!     server: Arc<ServerHandle>,
//! }
//!
//! impl Loadable for StatsService {
//!     fn on_load(&self, _registry: &Registry) -> anyhow::Result<()> {
//!         tracing::info!("Reading stats");
//!         Ok(())
//!     }
//! }
//!
//! impl Disableable for StatsService {
//!     fn on_disable(&self) -> anyhow::Result<()> {
//!         tracing::info!("Flushing stats");
//!         Ok(())
//!     }
//! }
//! ```

mod capability;
mod coordinator;
mod error;
mod invoker;
mod phase;

pub use capability::{Disableable, Enableable, Loadable, Reloadable};
pub use coordinator::{CoordinatorBuilder, CoordinatorInfo, LifecycleCoordinator};
pub use error::{LifecycleError, Result};
pub use invoker::PhaseInvoker;
pub use phase::{ComponentOutcome, LifecycleState, Phase, PhaseReport};
