use moss::config::PLATFORM_KEY;
use moss::prelude::*;

mod lobby;
mod proxy;

use lobby::{LobbyModule, PlayerTracker};
use proxy::InMemoryProxy;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting example plugin...");

    // 1. Read policies from the environment, Velocity by default
    let service = ConfigService::from_env();
    if service.get(PLATFORM_KEY).is_none() {
        service.set(PLATFORM_KEY, "velocity");
    }
    let config = CoordinatorConfig::from_service("lobby", &service)?;
    tracing::info!(
        "Running on {:?} with {} reloads",
        config.platform,
        config.reload_policy
    );

    // 2. Bind the coordinator to the proxy
    let proxy = Arc::new(InMemoryProxy::new());
    let mut adapter = HostAdapter::new(
        Arc::clone(&proxy),
        LifecycleCoordinator::builder(config).module::<LobbyModule>(),
    );

    // 3. Host callbacks
    adapter.on_load()?;
    let enabled = adapter.on_enable()?;
    tracing::info!("Registered {} listeners", enabled.listeners_registered);

    proxy.join("Steve");
    proxy.join("Alex");
    proxy.quit("Steve");

    for report in adapter.reload()? {
        for (component, error) in report.failures() {
            tracing::warn!("{} reported: {}", component, error);
        }
    }

    proxy.join("Notch");
    if let Some(registry) = adapter.coordinator().registry() {
        let tracker = registry.resolve::<PlayerTracker>()?;
        tracing::info!("{} players online", tracker.online());
    }

    let disabled = adapter.on_disable();
    tracing::info!(
        "Unregistered {} listeners, cancelled {} tasks",
        disabled.listeners_unregistered,
        disabled.tasks_cancelled
    );

    Ok(())
}
