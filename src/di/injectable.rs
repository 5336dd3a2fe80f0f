use crate::di::Registry;
use crate::error::Result;

/// Trait for types that can be built from the components of a [`Registry`]
///
/// This trait is typically implemented automatically via the `#[derive(Injectable)]` macro.
///
/// # Example
/// ```rust,ignore
/// use moss::prelude::*;
///
/// // 1. Define a capability
/// trait PlayerStore: Send + Sync {}
///
/// // 2. Derive Injectable on a struct
/// #[derive(Injectable, Component)]
/// pub struct JoinListener {
///     // Resolved by concrete type
///     server: Arc<ServerHandle>,
///     // Resolved through the first component exposing `dyn PlayerStore`
///     store: Arc<dyn PlayerStore>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the registry
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the registry.
    fn inject(registry: &Registry) -> Result<Self>;
}
