use crate::di::registry::{ComponentEntry, Unwired};
use crate::di::{Capabilities, Component, Injectable, Registry};
use crate::error::{MossError, Result};
use crate::module::Module;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

type Factory = Box<dyn Fn(&Registry, usize) -> Result<ComponentEntry> + Send>;

struct Pending {
    order: usize,
    type_id: TypeId,
    type_name: &'static str,
    capabilities: Vec<(TypeId, &'static str)>,
    factory: Factory,
}

impl Pending {
    fn provides(&self, type_name: &str) -> bool {
        self.type_name == type_name || self.capabilities.iter().any(|(_, name)| *name == type_name)
    }
}

/// Builder for a [`Registry`].
///
/// Registrations are recorded in order and only instantiated by
/// [`build`](RegistryBuilder::build), which wires every component before the
/// registry is handed out. A component may depend on components registered
/// after it; wiring retries deferred factories until no progress is made.
///
/// # Example
/// ```rust,ignore
/// let mut builder = RegistryBuilder::new();
/// builder
///     .instance(ServerHandle::current())
///     .component::<ScoreboardService>()
///     .module::<AppModule>()?;
/// let registry = builder.build()?;
/// ```
pub struct RegistryBuilder {
    pending: Vec<Pending>,
}

impl RegistryBuilder {
    /// Create a new registry builder
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Register a ready-made instance
    pub fn instance<T: Component>(&mut self, instance: T) -> &mut Self {
        self.arc(Arc::new(instance))
    }

    /// Register an instance that is already shared, keeping its identity
    pub fn arc<T: Component>(&mut self, instance: Arc<T>) -> &mut Self {
        self.push::<T>(Box::new(move |_, order| {
            Ok(ComponentEntry::new(order, Arc::clone(&instance)))
        }))
    }

    /// Register a factory that builds the component from already-wired ones
    pub fn factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Component,
        F: Fn(&Registry) -> Result<T> + Send + 'static,
    {
        self.push::<T>(Box::new(move |registry, order| {
            factory(registry).map(|instance| ComponentEntry::new(order, Arc::new(instance)))
        }))
    }

    /// Register a component whose dependencies are injected from the registry
    pub fn component<T: Component + Injectable>(&mut self) -> &mut Self {
        self.factory::<T, _>(T::inject)
    }

    /// Register every component declared by a module
    pub fn module<M: Module>(&mut self) -> Result<&mut Self> {
        M::register(self)?;
        Ok(self)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.pending.iter().any(|p| p.type_id == type_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn push<T: Component>(&mut self, factory: Factory) -> &mut Self {
        self.pending.push(Pending {
            order: self.pending.len(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            capabilities: Capabilities::<T>::declared(),
            factory,
        });
        self
    }

    /// Instantiate and wire every registration.
    ///
    /// # Errors
    /// - [`MossError::DuplicateComponent`] if a type was registered twice
    /// - [`MossError::DependencyNotFound`] if a dependency is never registered
    /// - [`MossError::CircularDependency`] if the remaining components only
    ///   wait on each other
    /// - [`MossError::Factory`] wrapping any other error returned by a
    ///   factory, immediately
    pub fn build(self) -> Result<Registry> {
        let mut seen = HashSet::new();
        for pending in &self.pending {
            if !seen.insert(pending.type_id) {
                return Err(MossError::DuplicateComponent {
                    type_name: pending.type_name.to_string(),
                });
            }
        }

        let mut registry = Registry::empty();
        let mut pending = self.pending;
        registry.begin_wiring(
            pending
                .iter()
                .map(|p| Unwired {
                    order: p.order,
                    capabilities: p.capabilities.iter().map(|(id, _)| *id).collect(),
                })
                .collect(),
        );

        while !pending.is_empty() {
            let waiting = pending.len();
            let mut deferred = Vec::new();
            let mut missing = Vec::new();

            for item in pending {
                match (item.factory)(&registry, item.order) {
                    Ok(entry) => {
                        tracing::trace!("Wired component {}", item.type_name);
                        registry.insert(entry);
                        registry.mark_wired(item.order);
                    }
                    Err(e) if e.is_missing_dependency() => {
                        missing.push(e);
                        deferred.push(item);
                    }
                    Err(e) => {
                        return Err(MossError::Factory {
                            type_name: item.type_name.to_string(),
                            source: e.into(),
                        });
                    }
                }
            }

            if deferred.len() == waiting {
                return Err(unsatisfiable(&deferred, missing));
            }
            pending = deferred;
        }

        registry.seal();
        tracing::debug!(
            "Registry {} built with {} components",
            registry.id(),
            registry.len()
        );
        Ok(registry)
    }
}

/// Pick the error describing why no deferred component could be wired.
fn unsatisfiable(deferred: &[Pending], missing: Vec<MossError>) -> MossError {
    let waiting_on_each_other = missing.iter().all(|e| match e {
        MossError::DependencyNotFound { type_name } => {
            deferred.iter().any(|p| p.provides(type_name))
        }
        _ => false,
    });

    if waiting_on_each_other {
        let cycle = deferred
            .iter()
            .map(|p| p.type_name)
            .collect::<Vec<_>>()
            .join(" -> ");
        return MossError::CircularDependency { cycle };
    }

    missing
        .into_iter()
        .find(|e| match e {
            MossError::DependencyNotFound { type_name } => {
                !deferred.iter().any(|p| p.provides(type_name))
            }
            _ => false,
        })
        .unwrap_or_else(|| MossError::Internal("wiring made no progress".to_string()))
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config {
        name: &'static str,
    }
    impl Component for Config {}

    struct Repository {
        config: Arc<Config>,
    }
    impl Component for Repository {}

    impl Injectable for Repository {
        fn inject(registry: &Registry) -> Result<Self> {
            Ok(Self {
                config: registry.resolve::<Config>()?,
            })
        }
    }

    struct Service {
        repository: Arc<Repository>,
    }
    impl Component for Service {}

    impl Injectable for Service {
        fn inject(registry: &Registry) -> Result<Self> {
            Ok(Self {
                repository: registry.resolve::<Repository>()?,
            })
        }
    }

    struct Ping;
    impl Component for Ping {}
    impl Injectable for Ping {
        fn inject(registry: &Registry) -> Result<Self> {
            registry.resolve::<Pong>()?;
            Ok(Ping)
        }
    }

    struct Pong;
    impl Component for Pong {}
    impl Injectable for Pong {
        fn inject(registry: &Registry) -> Result<Self> {
            registry.resolve::<Ping>()?;
            Ok(Pong)
        }
    }

    trait Greeter: Send + Sync {
        fn greeting(&self) -> &'static str;
    }

    struct Late;
    impl Component for Late {}

    struct FormalGreeter {
        _late: Arc<Late>,
    }

    impl Greeter for FormalGreeter {
        fn greeting(&self) -> &'static str {
            "good evening"
        }
    }

    impl Component for FormalGreeter {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.expose::<dyn Greeter>(|c| c as Arc<dyn Greeter>);
        }
    }

    impl Injectable for FormalGreeter {
        fn inject(registry: &Registry) -> Result<Self> {
            Ok(Self {
                _late: registry.resolve::<Late>()?,
            })
        }
    }

    struct CasualGreeter;

    impl Greeter for CasualGreeter {
        fn greeting(&self) -> &'static str {
            "hey"
        }
    }

    impl Component for CasualGreeter {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.expose::<dyn Greeter>(|c| c as Arc<dyn Greeter>);
        }
    }

    struct Doorman {
        greeter: Arc<dyn Greeter>,
    }
    impl Component for Doorman {}

    impl Injectable for Doorman {
        fn inject(registry: &Registry) -> Result<Self> {
            Ok(Self {
                greeter: registry.resolve_trait::<dyn Greeter>()?,
            })
        }
    }

    struct Echo;

    impl Greeter for Echo {
        fn greeting(&self) -> &'static str {
            "echo"
        }
    }

    impl Component for Echo {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.expose::<dyn Greeter>(|c| c as Arc<dyn Greeter>);
        }
    }

    impl Injectable for Echo {
        fn inject(registry: &Registry) -> Result<Self> {
            registry.resolve_trait::<dyn Greeter>()?;
            Ok(Echo)
        }
    }

    #[test]
    fn test_wires_in_registration_order() {
        let mut builder = RegistryBuilder::new();
        builder
            .instance(Config { name: "lobby" })
            .component::<Repository>()
            .component::<Service>();
        let registry = builder.build().unwrap();

        let service = registry.resolve::<Service>().unwrap();
        assert_eq!(service.repository.config.name, "lobby");
        assert!(Arc::ptr_eq(
            &service.repository,
            &registry.resolve::<Repository>().unwrap()
        ));
    }

    #[test]
    fn test_defers_forward_dependencies() {
        let mut builder = RegistryBuilder::new();
        builder
            .component::<Service>()
            .component::<Repository>()
            .instance(Config { name: "hub" });
        let registry = builder.build().unwrap();

        assert_eq!(
            registry.component_names(),
            vec!["Service", "Repository", "Config"]
        );
        assert_eq!(
            registry.resolve::<Service>().unwrap().repository.config.name,
            "hub"
        );
    }

    #[test]
    fn test_missing_dependency_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder.component::<Repository>();
        match builder.build() {
            Err(MossError::DependencyNotFound { type_name }) => {
                assert!(type_name.ends_with("Config"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_cycle_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder.component::<Ping>().component::<Pong>();
        assert!(matches!(
            builder.build(),
            Err(MossError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_trait_dependency_waits_for_first_implementation() {
        let mut builder = RegistryBuilder::new();
        builder
            .component::<FormalGreeter>()
            .instance(CasualGreeter)
            .component::<Doorman>()
            .instance(Late);
        let registry = builder.build().unwrap();

        let doorman = registry.resolve::<Doorman>().unwrap();
        let first = registry.resolve_trait::<dyn Greeter>().unwrap();
        assert_eq!(doorman.greeter.greeting(), "good evening");
        assert!(Arc::ptr_eq(&doorman.greeter, &first));
    }

    #[test]
    fn test_trait_dependency_on_itself_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder.component::<Echo>().instance(CasualGreeter);
        assert!(matches!(
            builder.build(),
            Err(MossError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder
            .instance(Config { name: "a" })
            .instance(Config { name: "b" });
        assert!(builder.contains::<Config>());
        assert!(matches!(
            builder.build(),
            Err(MossError::DuplicateComponent { .. })
        ));
    }

    #[test]
    fn test_factory_error_is_returned() {
        let mut builder = RegistryBuilder::new();
        builder.factory::<Config, _>(|_| Err(MossError::Internal("boom".into())));
        match builder.build() {
            Err(MossError::Factory { type_name, source }) => {
                assert!(type_name.ends_with("Config"));
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_arc_registration_keeps_identity() {
        let shared = Arc::new(Config { name: "shared" });
        let mut builder = RegistryBuilder::new();
        builder.arc(Arc::clone(&shared));
        let registry = builder.build().unwrap();
        assert!(Arc::ptr_eq(&shared, &registry.resolve::<Config>().unwrap()));
    }
}
