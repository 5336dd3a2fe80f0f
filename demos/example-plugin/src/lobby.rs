use crate::proxy::{InMemoryProxy, PlayerListener};
use moss::prelude::*;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Players currently connected to the lobby
#[derive(Component, Injectable)]
#[component(capabilities(Loadable, Disableable, Reloadable, PlayerListener))]
pub struct PlayerTracker {
    #[inject(default)]
    online: Mutex<BTreeSet<String>>,
}

impl PlayerTracker {
    pub fn online(&self) -> usize {
        self.online.lock().unwrap().len()
    }
}

impl Loadable for PlayerTracker {
    fn on_load(&self, registry: &Registry) -> anyhow::Result<()> {
        tracing::info!("Tracking players in registry {}", registry.id());
        Ok(())
    }
}

impl Reloadable for PlayerTracker {
    fn on_reload(&self) -> anyhow::Result<()> {
        tracing::info!("{} players online across reload", self.online());
        Ok(())
    }
}

impl Disableable for PlayerTracker {
    fn on_disable(&self) -> anyhow::Result<()> {
        self.online.lock().unwrap().clear();
        Ok(())
    }
}

impl PlayerListener for PlayerTracker {
    fn on_join(&self, player: &str) -> anyhow::Result<()> {
        self.online.lock().unwrap().insert(player.to_string());
        Ok(())
    }

    fn on_quit(&self, player: &str) -> anyhow::Result<()> {
        self.online.lock().unwrap().remove(player);
        Ok(())
    }
}

#[derive(Component, Injectable)]
#[component(capabilities(PlayerListener))]
pub struct WelcomeListener {
    tracker: Arc<PlayerTracker>,
    info: Arc<CoordinatorInfo>,
}

impl PlayerListener for WelcomeListener {
    fn on_join(&self, player: &str) -> anyhow::Result<()> {
        tracing::info!(
            "Welcome to {}, {}! ({} online, generation {})",
            self.info.plugin_name,
            player,
            self.tracker.online(),
            self.info.generation
        );
        Ok(())
    }

    fn on_quit(&self, _player: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Broadcasts announcements on a proxy task while enabled
#[derive(Component, Injectable)]
#[component(capabilities(Enableable, Reloadable))]
pub struct AnnouncementService {
    proxy: Arc<InMemoryProxy>,
    info: Arc<CoordinatorInfo>,
}

impl Enableable for AnnouncementService {
    fn on_enable(&self) -> anyhow::Result<()> {
        self.proxy.schedule(&self.info.plugin_name, "announcements");
        Ok(())
    }
}

impl Reloadable for AnnouncementService {
    fn on_reload(&self) -> anyhow::Result<()> {
        anyhow::bail!("announcements.yml is missing")
    }
}

#[module(components = [PlayerTracker])]
pub struct TrackingModule;

#[module(
    imports = [TrackingModule],
    components = [WelcomeListener, AnnouncementService],
)]
pub struct LobbyModule;
