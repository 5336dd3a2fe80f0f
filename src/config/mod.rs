//! Configuration
//!
//! [`ConfigService`] is a key/value store seeded from environment variables;
//! [`CoordinatorConfig`] is the typed view the coordinator and host adapter
//! read their policies from.

use crate::error::{MossError, Result};
use crate::host::Platform;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

pub const RELOAD_POLICY_KEY: &str = "MOSS_RELOAD_POLICY";
pub const RELOAD_ON_ENABLE_KEY: &str = "MOSS_RELOAD_ON_ENABLE";
pub const PLATFORM_KEY: &str = "MOSS_PLATFORM";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a service with every environment variable
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse a value, `None` when the key is absent
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| MossError::config(key, format!("{:?}: {}", raw, e)))
            })
            .transpose()
    }
}

/// How a coordinator reloads
///
/// The two policies are not interchangeable: `Rebuild` discards every
/// component and wires fresh instances, `InPlace` keeps instances and state
/// and only runs `Reloadable::on_reload`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Disable, load and enable again with a new registry
    #[default]
    Rebuild,
    /// Run `on_reload` on the live components
    InPlace,
}

/// Policies of one coordinator and its host adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Name the plugin is known by on the host
    pub plugin_name: String,
    pub platform: Option<Platform>,
    pub reload_policy: ReloadPolicy,
    /// Run an in-place reload sweep right after enabling
    pub reload_on_enable: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new("plugin")
    }
}

impl CoordinatorConfig {
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            platform: None,
            reload_policy: ReloadPolicy::default(),
            reload_on_enable: false,
        }
    }

    /// Defaults matching how the given host platform behaves
    pub fn for_platform(plugin_name: impl Into<String>, platform: Platform) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            platform: Some(platform),
            reload_policy: platform.reload_policy(),
            reload_on_enable: platform.reload_on_enable(),
        }
    }

    /// Read the configuration from a [`ConfigService`]
    ///
    /// `MOSS_PLATFORM` picks the platform defaults; `MOSS_RELOAD_POLICY` and
    /// `MOSS_RELOAD_ON_ENABLE` override them.
    pub fn from_service(plugin_name: impl Into<String>, service: &ConfigService) -> Result<Self> {
        let mut config = match service.get_parsed::<Platform>(PLATFORM_KEY)? {
            Some(platform) => Self::for_platform(plugin_name, platform),
            None => Self::new(plugin_name),
        };

        if let Some(policy) = service.get_parsed::<ReloadPolicy>(RELOAD_POLICY_KEY)? {
            config.reload_policy = policy;
        }
        if let Some(reload) = service.get_parsed::<bool>(RELOAD_ON_ENABLE_KEY)? {
            config.reload_on_enable = reload;
        }

        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MossError::config("json", e.to_string()))
    }

    pub fn with_reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.reload_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_get_set() {
        let service = ConfigService::new();
        assert_eq!(service.get("missing"), None);
        service.set("MOSS_RELOAD_POLICY", "in_place");
        assert_eq!(service.get("MOSS_RELOAD_POLICY").as_deref(), Some("in_place"));
    }

    #[test]
    fn test_platform_defaults() {
        let config = CoordinatorConfig::for_platform("lobby", Platform::BungeeCord);
        assert_eq!(config.reload_policy, ReloadPolicy::InPlace);
        assert!(config.reload_on_enable);

        let config = CoordinatorConfig::for_platform("lobby", Platform::Velocity);
        assert_eq!(config.reload_policy, ReloadPolicy::Rebuild);
        assert!(!config.reload_on_enable);
    }

    #[test]
    fn test_from_service_overrides_platform() {
        let service = ConfigService::new();
        service.set(PLATFORM_KEY, "Paper");
        service.set(RELOAD_POLICY_KEY, "IN_PLACE");
        service.set(RELOAD_ON_ENABLE_KEY, " true ");

        let config = CoordinatorConfig::from_service("hub", &service).unwrap();
        assert_eq!(config.plugin_name, "hub");
        assert_eq!(config.platform, Some(Platform::Paper));
        assert_eq!(config.reload_policy, ReloadPolicy::InPlace);
        assert!(config.reload_on_enable);
    }

    #[test]
    fn test_from_service_rejects_garbage() {
        let service = ConfigService::new();
        service.set(RELOAD_POLICY_KEY, "sometimes");
        let err = CoordinatorConfig::from_service("hub", &service).unwrap_err();
        assert!(matches!(err, MossError::Config { key, .. } if key == RELOAD_POLICY_KEY));
    }

    #[test]
    fn test_from_json() {
        let config = CoordinatorConfig::from_json(
            r#"{ "plugin_name": "proxy-core", "platform": "bungeecord", "reload_policy": "in_place" }"#,
        )
        .unwrap();
        assert_eq!(config.plugin_name, "proxy-core");
        assert_eq!(config.platform, Some(Platform::BungeeCord));
        assert_eq!(config.reload_policy, ReloadPolicy::InPlace);
        assert!(!config.reload_on_enable);

        assert!(CoordinatorConfig::from_json("{ \"reload_policy\": 3 }").is_err());
    }
}
