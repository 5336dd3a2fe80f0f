use crate::lifecycle::{Disableable, Enableable, Loadable, Reloadable};
use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A value managed by the [`Registry`](crate::di::Registry).
///
/// A component takes part in lifecycle phases (and in any platform-specific
/// sweep, such as host listener registration) only through the capabilities
/// it exposes. Capabilities are collected once, when the component is wired.
///
/// This trait is usually implemented with `#[derive(Component)]`:
///
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(capabilities(Loadable, Enableable))]
/// pub struct ScoreboardService { /* ... */ }
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    /// Declare the capabilities this component exposes.
    ///
    /// The default exposes nothing, so the component is registered and
    /// resolvable but never invoked by a phase.
    fn capabilities(caps: &mut Capabilities<Self>) {
        let _ = caps;
    }
}

/// A type-erased `Arc<C>` view of a component, keyed by the `TypeId` of `C`.
#[derive(Clone)]
pub(crate) struct CapabilityView {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) view: Arc<dyn Any + Send + Sync>,
}

/// Capability table of a single component, filled by [`Component::capabilities`].
///
/// The table is filled twice per registration: once without an instance,
/// when the component is registered, to learn which capabilities it will
/// expose, and once with the wired instance to build the views.
pub struct Capabilities<T> {
    instance: Option<Arc<T>>,
    declared: Vec<(TypeId, &'static str)>,
    views: Vec<CapabilityView>,
}

impl<T: Component> Capabilities<T> {
    /// Capabilities `T` exposes, as `(TypeId, type name)` pairs.
    pub(crate) fn declared() -> Vec<(TypeId, &'static str)> {
        let mut caps = Self {
            instance: None,
            declared: Vec::new(),
            views: Vec::new(),
        };
        T::capabilities(&mut caps);
        caps.declared
    }

    pub(crate) fn collect(instance: Arc<T>) -> (Arc<T>, Vec<CapabilityView>) {
        let mut caps = Self {
            instance: Some(Arc::clone(&instance)),
            declared: Vec::new(),
            views: Vec::new(),
        };
        T::capabilities(&mut caps);
        (instance, caps.views)
    }

    /// Expose the component as `C`, usually a trait object.
    ///
    /// Exposing the same capability twice keeps the first view.
    pub fn expose<C>(&mut self, cast: impl FnOnce(Arc<T>) -> Arc<C>) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let id = TypeId::of::<C>();
        if self.declared.iter().any(|(declared, _)| *declared == id) {
            return self;
        }

        let name = std::any::type_name::<C>();
        self.declared.push((id, name));
        if let Some(instance) = &self.instance {
            let view: Arc<C> = cast(Arc::clone(instance));
            self.views.push(CapabilityView {
                id,
                name,
                view: Arc::new(view),
            });
        }
        self
    }

    pub fn loadable(&mut self) -> &mut Self
    where
        T: Loadable,
    {
        self.expose::<dyn Loadable>(|c| c as Arc<dyn Loadable>)
    }

    pub fn enableable(&mut self) -> &mut Self
    where
        T: Enableable,
    {
        self.expose::<dyn Enableable>(|c| c as Arc<dyn Enableable>)
    }

    pub fn disableable(&mut self) -> &mut Self
    where
        T: Disableable,
    {
        self.expose::<dyn Disableable>(|c| c as Arc<dyn Disableable>)
    }

    pub fn reloadable(&mut self) -> &mut Self
    where
        T: Reloadable,
    {
        self.expose::<dyn Reloadable>(|c| c as Arc<dyn Reloadable>)
    }

    /// The instance being declared, `None` while only the capability
    /// types are collected.
    pub fn instance(&self) -> Option<&Arc<T>> {
        self.instance.as_ref()
    }

    /// Number of capabilities declared so far.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}

/// A component seen through one of its capabilities.
///
/// Carries the concrete type name of the component so failures can be
/// reported against the component rather than the capability.
pub struct ComponentRef<C: ?Sized> {
    type_name: &'static str,
    instance: Arc<C>,
}

impl<C: ?Sized> ComponentRef<C> {
    pub(crate) fn new(type_name: &'static str, instance: Arc<C>) -> Self {
        Self {
            type_name,
            instance,
        }
    }

    /// Fully qualified type name of the component.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, for log lines.
    pub fn name(&self) -> &'static str {
        simple_name(self.type_name)
    }

    pub fn get(&self) -> &C {
        &self.instance
    }

    pub fn instance(&self) -> &Arc<C> {
        &self.instance
    }

    pub fn into_inner(self) -> Arc<C> {
        self.instance
    }

    /// Whether both references point at the same component instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl<C: ?Sized> Clone for ComponentRef<C> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            instance: Arc::clone(&self.instance),
        }
    }
}

impl<C: ?Sized> Deref for ComponentRef<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

impl<C: ?Sized> fmt::Debug for ComponentRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("component", &self.type_name)
            .finish()
    }
}

/// Strip the module path from a type name, keeping generic arguments intact.
pub(crate) fn simple_name(type_name: &'static str) -> &'static str {
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(idx) => &type_name[idx + 2..],
        None => type_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Component for Plain {}

    struct Hooked;

    impl Loadable for Hooked {
        fn on_load(&self, _registry: &crate::di::Registry) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Component for Hooked {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.loadable().loadable();
        }
    }

    #[test]
    fn test_component_without_capabilities() {
        let (_, views) = Capabilities::collect(Arc::new(Plain));
        assert!(views.is_empty());
    }

    #[test]
    fn test_duplicate_capability_is_kept_once() {
        let (_, views) = Capabilities::collect(Arc::new(Hooked));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, TypeId::of::<dyn Loadable>());
    }

    #[test]
    fn test_declared_matches_collected_views() {
        let declared = Capabilities::<Hooked>::declared();
        let (_, views) = Capabilities::collect(Arc::new(Hooked));
        assert_eq!(declared.len(), views.len());
        assert_eq!(declared[0].0, views[0].id);
        assert_eq!(declared[0].1, views[0].name);
        assert!(Capabilities::<Plain>::declared().is_empty());
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("my_plugin::listener::JoinListener"), "JoinListener");
        assert_eq!(
            simple_name("my_plugin::Cache<alloc::string::String>"),
            "Cache<alloc::string::String>"
        );
        assert_eq!(simple_name("Standalone"), "Standalone");
    }
}
