use crate::di::RegistryBuilder;
use crate::error::Result;

/// Trait for plugin modules
///
/// A module is the unit of component discovery: it declares which
/// components make up (part of) a plugin. Modules are typically defined
/// using the `#[module]` macro, which implements this trait and generates
/// the registration logic.
///
/// # Example
/// ```rust,ignore
/// use moss::module;
///
/// #[module(
///     imports = [StorageModule],
///     components = [JoinListener, ScoreboardService],
/// )]
/// pub struct AppModule;
/// ```
pub trait Module {
    /// Register all components of this module, imports first
    fn register(builder: &mut RegistryBuilder) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::sync::Mutex;

    trait Greeter: Send + Sync {
        fn greet(&self, player: &str) -> String;
    }

    #[derive(Component, Injectable)]
    struct Clock;

    impl Clock {
        fn now(&self) -> &'static str {
            "noon"
        }
    }

    #[derive(Component, Injectable)]
    #[component(capabilities(Greeter, Enableable))]
    struct EnglishGreeter {
        clock: Arc<Clock>,
        #[inject(default)]
        greeted: Mutex<u32>,
    }

    impl Greeter for EnglishGreeter {
        fn greet(&self, player: &str) -> String {
            *self.greeted.lock().unwrap() += 1;
            format!("Good {}, {}", self.clock.now(), player)
        }
    }

    impl Enableable for EnglishGreeter {
        fn on_enable(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Component, Injectable)]
    struct Doorman {
        greeter: Arc<dyn Greeter>,
    }

    #[module(components = [Clock])]
    struct CoreModule;

    #[module(
        imports = [CoreModule],
        components = [Doorman, EnglishGreeter],
    )]
    struct LobbyModule;

    #[test]
    fn test_module_registers_imports_first() {
        let mut builder = RegistryBuilder::new();
        builder.module::<LobbyModule>().unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(
            registry.component_names(),
            vec!["Clock", "Doorman", "EnglishGreeter"]
        );
    }

    #[test]
    fn test_derived_capabilities_and_injection() {
        let mut builder = RegistryBuilder::new();
        builder.module::<LobbyModule>().unwrap();
        let registry = builder.build().unwrap();

        let doorman = registry.resolve::<Doorman>().unwrap();
        assert_eq!(doorman.greeter.greet("Steve"), "Good noon, Steve");

        let greeter = registry.resolve::<EnglishGreeter>().unwrap();
        assert_eq!(*greeter.greeted.lock().unwrap(), 1);

        let enableables = registry.components_of::<dyn Enableable>();
        assert_eq!(enableables.len(), 1);
        assert_eq!(enableables[0].name(), "EnglishGreeter");
        assert!(registry.components_of::<dyn Loadable>().is_empty());
        assert_eq!(registry.capabilities_of::<Clock>(), Vec::<&str>::new());
    }
}
