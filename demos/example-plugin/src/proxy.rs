//! A proxy host kept entirely in memory

use moss::prelude::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// The listener capability this proxy dispatches events to
pub trait PlayerListener: Send + Sync {
    fn on_join(&self, player: &str) -> anyhow::Result<()>;
    fn on_quit(&self, player: &str) -> anyhow::Result<()>;
}

struct Registration {
    plugin: String,
    listener: Arc<dyn PlayerListener>,
}

#[derive(Default)]
pub struct InMemoryProxy {
    listeners: Mutex<Vec<Registration>>,
    tasks: Mutex<Vec<(String, TaskId)>>,
    next_task: AtomicU64,
}

impl InMemoryProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, plugin: &str, task: &str) -> TaskId {
        let id = TaskId(self.next_task.fetch_add(1, Ordering::SeqCst));
        tracing::info!("Scheduled {} ({}) for {}", task, id, plugin);
        self.tasks.lock().unwrap().push((plugin.to_string(), id));
        id
    }

    pub fn join(&self, player: &str) {
        self.dispatch(player, |listener| listener.on_join(player));
    }

    pub fn quit(&self, player: &str) {
        self.dispatch(player, |listener| listener.on_quit(player));
    }

    fn dispatch(&self, player: &str, event: impl Fn(&dyn PlayerListener) -> anyhow::Result<()>) {
        let listeners: Vec<Arc<dyn PlayerListener>> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in listeners {
            if let Err(e) = event(listener.as_ref()) {
                tracing::error!("Listener failed handling {}: {:#}", player, e);
            }
        }
    }
}

impl Component for InMemoryProxy {}

impl HostPlatform for InMemoryProxy {
    type Listener = dyn PlayerListener;

    fn name(&self) -> String {
        "in-memory-proxy".to_string()
    }

    fn register_listener(&self, plugin: &str, listener: Arc<dyn PlayerListener>) -> anyhow::Result<()> {
        self.listeners.lock().unwrap().push(Registration {
            plugin: plugin.to_string(),
            listener,
        });
        Ok(())
    }

    fn unregister_listener(&self, plugin: &str, listener: &Arc<dyn PlayerListener>) -> anyhow::Result<()> {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|r| !(r.plugin == plugin && Arc::ptr_eq(&r.listener, listener)));
        if listeners.len() == before {
            anyhow::bail!("listener was never registered by {}", plugin);
        }
        Ok(())
    }

    fn scheduled_tasks(&self, plugin: &str) -> Vec<TaskId> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| owner == plugin)
            .map(|(_, id)| *id)
            .collect()
    }

    fn cancel_task(&self, task: TaskId) -> anyhow::Result<()> {
        self.tasks.lock().unwrap().retain(|(_, id)| *id != task);
        tracing::info!("Cancelled {}", task);
        Ok(())
    }
}
