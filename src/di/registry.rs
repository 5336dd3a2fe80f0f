use crate::di::component::{CapabilityView, Capabilities, Component, ComponentRef, simple_name};
use crate::error::{MossError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Identity of one registry lifetime. Every build produces a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryId(Uuid);

impl RegistryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registration not wired yet, with the capability types it will expose.
pub(crate) struct Unwired {
    pub(crate) order: usize,
    pub(crate) capabilities: Vec<TypeId>,
}

pub(crate) struct ComponentEntry {
    order: usize,
    type_id: TypeId,
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
    views: Vec<CapabilityView>,
}

impl ComponentEntry {
    pub(crate) fn new<T: Component>(order: usize, instance: Arc<T>) -> Self {
        let (instance, views) = Capabilities::collect(instance);
        Self {
            order,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            instance,
            views,
        }
    }

    fn view<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        let id = TypeId::of::<C>();
        self.views
            .iter()
            .find(|view| view.id == id)
            .and_then(|view| view.view.downcast_ref::<Arc<C>>())
            .cloned()
    }
}

/// Container holding the live components of one coordinator lifetime.
///
/// Components are kept in registration order; every capability lookup
/// returns them in that order. A registry is built once by a
/// [`RegistryBuilder`](crate::di::RegistryBuilder) and never gains
/// components afterwards. [`close`](Registry::close) drops every
/// component the registry holds.
pub struct Registry {
    id: RegistryId,
    entries: RwLock<Vec<ComponentEntry>>,
    index: DashMap<TypeId, usize>,
    unwired: Vec<Unwired>,
    closed: AtomicBool,
}

impl Registry {
    pub(crate) fn empty() -> Self {
        Self {
            id: RegistryId::new(),
            entries: RwLock::new(Vec::new()),
            index: DashMap::new(),
            unwired: Vec::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn insert(&mut self, entry: ComponentEntry) {
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        self.index.insert(entry.type_id, entries.len());
        entries.push(entry);
    }

    pub(crate) fn begin_wiring(&mut self, unwired: Vec<Unwired>) {
        self.unwired = unwired;
    }

    pub(crate) fn mark_wired(&mut self, order: usize) {
        self.unwired.retain(|pending| pending.order != order);
    }

    /// Restore registration order after out-of-order wiring.
    pub(crate) fn seal(&mut self) {
        self.unwired.clear();
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        entries.sort_by_key(|entry| entry.order);

        self.index.clear();
        for (position, entry) in entries.iter().enumerate() {
            self.index.insert(entry.type_id, position);
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Resolve a component by its concrete type.
    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        self.ensure_open()?;

        let position = self
            .index
            .get(&TypeId::of::<T>())
            .map(|position| *position)
            .ok_or_else(MossError::not_found::<T>)?;

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get(position)
            .ok_or_else(MossError::not_found::<T>)?;
        Arc::clone(&entry.instance)
            .downcast::<T>()
            .map_err(|_| MossError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve the first component exposing capability `C`, by registration order.
    ///
    /// While the registry is being wired, the lookup fails if a registration
    /// ahead of the current match exposes `C` but is not wired yet, so the
    /// wiring is retried once the first implementation exists.
    pub fn resolve_trait<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        self.ensure_open()?;

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let first = entries
            .iter()
            .filter_map(|entry| entry.view::<C>().map(|view| (entry.order, view)))
            .min_by_key(|(order, _)| *order);

        let id = TypeId::of::<C>();
        let bound = first.as_ref().map_or(usize::MAX, |(order, _)| *order);
        if self
            .unwired
            .iter()
            .any(|pending| pending.order < bound && pending.capabilities.contains(&id))
        {
            return Err(MossError::not_found::<C>());
        }

        first
            .map(|(_, view)| view)
            .ok_or_else(MossError::not_found::<C>)
    }

    /// All components exposing capability `C`, in registration order.
    ///
    /// A closed registry has no components.
    pub fn components_of<C: ?Sized + Send + Sync + 'static>(&self) -> Vec<ComponentRef<C>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter_map(|entry| {
                entry
                    .view::<C>()
                    .map(|view| ComponentRef::new(entry.type_name, view))
            })
            .collect()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    /// Short type names of every component, in registration order.
    pub fn component_names(&self) -> Vec<&'static str> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|entry| simple_name(entry.type_name))
            .collect()
    }

    /// Capability names exposed by the component of type `T`.
    pub fn capabilities_of<T: 'static>(&self) -> Vec<&'static str> {
        let Some(position) = self.index.get(&TypeId::of::<T>()).map(|p| *p) else {
            return Vec::new();
        };
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(position)
            .map(|entry| entry.views.iter().map(|view| view.name).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every component. Later lookups fail with
    /// [`MossError::RegistryClosed`]. Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let released = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let count = entries.len();
            entries.clear();
            count
        };
        self.index.clear();

        tracing::debug!("Registry {} closed ({} components released)", self.id, released);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(MossError::RegistryClosed {
                registry: self.id.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("components", &self.component_names())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestService {
        value: i32,
    }

    impl Component for TestService {}

    trait MyTrait: Send + Sync {
        fn get_value(&self) -> i32;
    }

    struct MyTraitImpl {
        value: i32,
    }

    impl MyTrait for MyTraitImpl {
        fn get_value(&self) -> i32 {
            self.value
        }
    }

    impl Component for MyTraitImpl {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.expose::<dyn MyTrait>(|c| c as Arc<dyn MyTrait>);
        }
    }

    struct OtherTraitImpl;

    impl MyTrait for OtherTraitImpl {
        fn get_value(&self) -> i32 {
            7
        }
    }

    impl Component for OtherTraitImpl {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.expose::<dyn MyTrait>(|c| c as Arc<dyn MyTrait>);
        }
    }

    fn registry_with(entries: Vec<ComponentEntry>) -> Registry {
        let mut registry = Registry::empty();
        for entry in entries {
            registry.insert(entry);
        }
        registry.seal();
        registry
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = registry_with(vec![ComponentEntry::new(
            0,
            Arc::new(TestService { value: 42 }),
        )]);
        let service = registry.resolve::<TestService>().unwrap();
        assert_eq!(service.value, 42);
        assert!(registry.contains::<TestService>());
    }

    #[test]
    fn test_resolve_missing() {
        let registry = Registry::empty();
        let err = registry.resolve::<TestService>().unwrap_err();
        assert!(matches!(err, MossError::DependencyNotFound { .. }));
    }

    #[test]
    fn test_register_and_resolve_trait() {
        let registry = registry_with(vec![ComponentEntry::new(
            0,
            Arc::new(MyTraitImpl { value: 99 }),
        )]);
        let trait_instance = registry.resolve_trait::<dyn MyTrait>().unwrap();
        assert_eq!(trait_instance.get_value(), 99);
    }

    #[test]
    fn test_components_of_follows_registration_order() {
        // Inserted out of order, as happens when wiring defers a component.
        let registry = registry_with(vec![
            ComponentEntry::new(2, Arc::new(OtherTraitImpl)),
            ComponentEntry::new(0, Arc::new(MyTraitImpl { value: 1 })),
            ComponentEntry::new(1, Arc::new(TestService { value: 0 })),
        ]);

        let values: Vec<i32> = registry
            .components_of::<dyn MyTrait>()
            .iter()
            .map(|c| c.get_value())
            .collect();
        assert_eq!(values, vec![1, 7]);
        assert_eq!(
            registry.component_names(),
            vec!["MyTraitImpl", "TestService", "OtherTraitImpl"]
        );
        assert_eq!(registry.resolve::<TestService>().unwrap().value, 0);
    }

    #[test]
    fn test_resolve_and_view_share_instance() {
        let registry = registry_with(vec![ComponentEntry::new(
            0,
            Arc::new(MyTraitImpl { value: 5 }),
        )]);
        let concrete = registry.resolve::<MyTraitImpl>().unwrap();
        let view = registry.resolve_trait::<dyn MyTrait>().unwrap();
        assert_eq!(
            Arc::as_ptr(&concrete) as *const u8,
            Arc::as_ptr(&view) as *const u8
        );
    }

    #[test]
    fn test_close_releases_components() {
        let service = Arc::new(TestService { value: 1 });
        let registry = registry_with(vec![ComponentEntry::new(0, Arc::clone(&service))]);
        assert_eq!(Arc::strong_count(&service), 2);

        registry.close();
        registry.close();

        assert!(registry.is_closed());
        assert!(registry.is_empty());
        assert_eq!(Arc::strong_count(&service), 1);
        assert!(matches!(
            registry.resolve::<TestService>(),
            Err(MossError::RegistryClosed { .. })
        ));
        assert!(registry.components_of::<dyn MyTrait>().is_empty());
    }

    #[test]
    fn test_capabilities_of() {
        let registry = registry_with(vec![
            ComponentEntry::new(0, Arc::new(MyTraitImpl { value: 0 })),
            ComponentEntry::new(1, Arc::new(TestService { value: 0 })),
        ]);
        assert_eq!(registry.capabilities_of::<MyTraitImpl>().len(), 1);
        assert!(registry.capabilities_of::<TestService>().is_empty());
        assert!(registry.capabilities_of::<OtherTraitImpl>().is_empty());
    }
}
