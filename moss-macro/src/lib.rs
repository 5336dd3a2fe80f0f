use proc_macro::TokenStream;

mod component;
mod injectable;
mod module;

/// Derive macro declaring the capabilities a component exposes
///
/// Every path listed in `capabilities(...)` must name an object-safe trait
/// the struct implements. The component is exposed as `Arc<dyn Trait>` for
/// each of them.
///
/// # Example
/// ```ignore
/// use moss::prelude::*;
///
/// #[derive(Component, Injectable)]
/// #[component(capabilities(Enableable, Disableable, PlayerListener))]
/// pub struct LobbyService {
///     players: Arc<PlayerRepository>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::derive_component(input)
}

/// Derive macro for making a struct injectable from the registry
///
/// `Arc<T>` fields are resolved by type, `Arc<dyn Trait>` fields resolve the
/// first component exposing `Trait`. Fields marked `#[inject(default)]` are
/// initialised with `Default::default()`.
///
/// # Example
/// ```ignore
/// use moss::Injectable;
///
/// #[derive(Injectable)]
/// pub struct PartyService {
///     repository: Arc<dyn PartyRepository>,
///     #[inject(default)]
///     invites: Mutex<Vec<Invite>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for defining a module with imports and components
///
/// Imported modules are registered first, then the components in the
/// order they are listed. Registration order is the order every lifecycle
/// phase visits the components in.
///
/// # Example
/// ```ignore
/// use moss::module;
///
/// #[module(
///     imports = [StorageModule],
///     components = [PartyService, PartyListener],
/// )]
/// pub struct PartyModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
