//! Phase Invoker
//!
//! Fans a phase out over every component exposing a capability, isolating
//! failures per component.

use super::{ComponentOutcome, LifecycleError, Phase, PhaseReport};
use crate::di::{ComponentRef, Registry};
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Invokes one phase against the components of a registry
///
/// Components are invoked sequentially in registration order. An `Err` or a
/// panic from one component is caught, recorded and reported; the next
/// component is invoked regardless. There is no timeout: a hook that blocks
/// blocks the phase.
///
/// # Example
///
/// ```rust,ignore
/// let report = PhaseInvoker::new(&registry, Phase::Enable).invoke_with::<dyn Enableable, _, _>(
///     |component| component.on_enable(),
///     |component, e| tracing::error!("Failed to enable {}: {}", component.name(), e),
/// );
/// assert!(report.is_clean());
/// ```
pub struct PhaseInvoker<'r> {
    registry: &'r Registry,
    phase: Phase,
}

impl<'r> PhaseInvoker<'r> {
    pub fn new(registry: &'r Registry, phase: Phase) -> Self {
        Self { registry, phase }
    }

    /// Invoke `action` on every component exposing `C`, dropping failures
    ///
    /// Failures are still recorded in the returned report.
    pub fn invoke<C, F>(&self, action: F) -> PhaseReport
    where
        C: ?Sized + Send + Sync + 'static,
        F: FnMut(&C) -> anyhow::Result<()>,
    {
        self.invoke_with::<C, _, _>(action, |_, _| {})
    }

    /// Invoke `action` on every component exposing `C`, calling `on_failure`
    /// once per failing component
    pub fn invoke_with<C, F, E>(&self, mut action: F, mut on_failure: E) -> PhaseReport
    where
        C: ?Sized + Send + Sync + 'static,
        F: FnMut(&C) -> anyhow::Result<()>,
        E: FnMut(&ComponentRef<C>, &LifecycleError),
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let components = self.registry.components_of::<C>();

        tracing::debug!(
            "Invoking {} on {} components of {}",
            self.phase,
            components.len(),
            self.registry.id()
        );

        let mut outcomes = Vec::with_capacity(components.len());
        for component in &components {
            tracing::trace!("{}: {}", self.phase, component.name());

            let result = match panic::catch_unwind(AssertUnwindSafe(|| action(component.get()))) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(LifecycleError::component_failed(
                    component.type_name(),
                    self.phase,
                    e,
                )),
                Err(payload) => Err(LifecycleError::component_failed(
                    component.type_name(),
                    self.phase,
                    anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())),
                )),
            };

            if let Err(e) = &result {
                on_failure(component, e);
            }
            outcomes.push(ComponentOutcome {
                component: component.type_name(),
                result,
            });
        }

        PhaseReport::new(
            self.phase,
            self.registry.id(),
            started_at,
            start.elapsed(),
            outcomes,
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Capabilities, Component, RegistryBuilder};
    use crate::lifecycle::Enableable;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    struct Recorder {
        name: &'static str,
        calls: Calls,
        fail: bool,
    }

    impl Enableable for Recorder {
        fn on_enable(&self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(self.name);
            if self.fail {
                anyhow::bail!("{} refused to enable", self.name);
            }
            Ok(())
        }
    }

    // Distinct types so each can be registered once.
    struct First(Recorder);
    struct Second(Recorder);
    struct Third(Recorder);
    struct Panicky;
    struct Silent;

    macro_rules! delegate {
        ($($ty:ident),*) => {$(
            impl Enableable for $ty {
                fn on_enable(&self) -> anyhow::Result<()> {
                    self.0.on_enable()
                }
            }
            impl Component for $ty {
                fn capabilities(caps: &mut Capabilities<Self>) {
                    caps.enableable();
                }
            }
        )*};
    }
    delegate!(First, Second, Third);

    impl Enableable for Panicky {
        fn on_enable(&self) -> anyhow::Result<()> {
            panic!("listener table corrupted");
        }
    }

    impl Component for Panicky {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.enableable();
        }
    }

    impl Component for Silent {}

    fn recorder(name: &'static str, calls: &Calls, fail: bool) -> Recorder {
        Recorder {
            name,
            calls: Arc::clone(calls),
            fail,
        }
    }

    #[test]
    fn test_failure_does_not_stop_siblings() {
        let calls: Calls = Arc::default();
        let mut builder = RegistryBuilder::new();
        builder
            .instance(First(recorder("first", &calls, false)))
            .instance(Second(recorder("second", &calls, true)))
            .instance(Third(recorder("third", &calls, false)));
        let registry = builder.build().unwrap();

        let mut failed = Vec::new();
        let report = PhaseInvoker::new(&registry, Phase::Enable).invoke_with::<dyn Enableable, _, _>(
            |c| c.on_enable(),
            |c, e| failed.push((c.name(), e.to_string())),
        );

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "Second");
        assert!(failed[0].1.contains("second refused to enable"));
        assert_eq!(report.invoked(), 3);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.succeeded().len(), 2);
        assert_eq!(report.registry(), registry.id());
    }

    #[test]
    fn test_failures_recorded_without_callback() {
        let calls: Calls = Arc::default();
        let mut builder = RegistryBuilder::new();
        builder
            .instance(First(recorder("first", &calls, true)))
            .instance(Second(recorder("second", &calls, false)));
        let registry = builder.build().unwrap();

        let report =
            PhaseInvoker::new(&registry, Phase::Enable).invoke::<dyn Enableable, _>(|c| c.on_enable());

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("First"));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_panic_is_isolated() {
        let calls: Calls = Arc::default();
        let mut builder = RegistryBuilder::new();
        builder
            .instance(Panicky)
            .instance(Third(recorder("third", &calls, false)));
        let registry = builder.build().unwrap();

        let report =
            PhaseInvoker::new(&registry, Phase::Enable).invoke::<dyn Enableable, _>(|c| c.on_enable());

        assert_eq!(*calls.lock().unwrap(), vec!["third"]);
        let (component, error) = report.failures().next().unwrap();
        assert!(component.ends_with("Panicky"));
        assert!(error.to_string().contains("listener table corrupted"));
    }

    #[test]
    fn test_components_without_capability_are_skipped() {
        let mut builder = RegistryBuilder::new();
        builder.instance(Silent);
        let registry = builder.build().unwrap();

        let report =
            PhaseInvoker::new(&registry, Phase::Enable).invoke::<dyn Enableable, _>(|c| c.on_enable());
        assert_eq!(report.invoked(), 0);
        assert!(report.is_clean());
        assert_eq!(registry.len(), 1);
    }
}
