//! Configuration for registries and the application context
//!
//! Loaded from JSON (all fields optional) and then overridden from
//! `STRATAGEM_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StratagemError};

/// Environment variable overriding [`StratagemConfig::cache_timeout_secs`]
pub const ENV_CACHE_TIMEOUT: &str = "STRATAGEM_CACHE_TIMEOUT";
/// Environment variable overriding [`StratagemConfig::max_cache_entries`]
pub const ENV_MAX_CACHE_ENTRIES: &str = "STRATAGEM_MAX_CACHE_ENTRIES";
/// Environment variable overriding [`StratagemConfig::enabled_plugins`] (comma separated)
pub const ENV_ENABLED_PLUGINS: &str = "STRATAGEM_ENABLED_PLUGINS";
/// Environment variable overriding [`StratagemConfig::disabled_plugins`] (comma separated)
pub const ENV_DISABLED_PLUGINS: &str = "STRATAGEM_DISABLED_PLUGINS";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratagemConfig {
    /// Lifetime of cached registry views in seconds
    #[serde(default = "default_cache_timeout")]
    pub cache_timeout_secs: u64,

    /// Maximum entries held by the shared memory cache
    #[serde(default = "default_max_entries")]
    pub max_cache_entries: usize,

    /// When set, only the listed plugins are loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_plugins: Option<Vec<String>>,

    /// Plugins that are never loaded (ignored when `enabled_plugins` is set)
    #[serde(default)]
    pub disabled_plugins: Vec<String>,
}

fn default_cache_timeout() -> u64 { 300 }
fn default_max_entries() -> usize { 1000 }

impl Default for StratagemConfig {
    fn default() -> Self {
        Self {
            cache_timeout_secs: default_cache_timeout(),
            max_cache_entries: default_max_entries(),
            enabled_plugins: None,
            disabled_plugins: Vec::new(),
        }
    }
}

impl StratagemConfig {
    /// Parse configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Apply `STRATAGEM_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// [`with_env_overrides`](Self::with_env_overrides) passes the process
    /// environment; tests pass a map.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CACHE_TIMEOUT) {
            self.cache_timeout_secs = raw.trim().parse().map_err(|_| StratagemError::InvalidConfig {
                reason: format!("{} must be a whole number of seconds, got '{}'", ENV_CACHE_TIMEOUT, raw),
            })?;
        }

        if let Some(raw) = lookup(ENV_MAX_CACHE_ENTRIES) {
            self.max_cache_entries = raw.trim().parse().map_err(|_| StratagemError::InvalidConfig {
                reason: format!("{} must be a positive integer, got '{}'", ENV_MAX_CACHE_ENTRIES, raw),
            })?;
        }

        if let Some(raw) = lookup(ENV_ENABLED_PLUGINS) {
            self.enabled_plugins = Some(split_list(&raw));
        }

        if let Some(raw) = lookup(ENV_DISABLED_PLUGINS) {
            self.disabled_plugins = split_list(&raw);
        }

        self.validate()?;
        Ok(self)
    }

    /// Set the cache timeout
    pub fn with_cache_timeout(mut self, ttl: Duration) -> Self {
        self.cache_timeout_secs = ttl.as_secs();
        self
    }

    /// Set the maximum number of cache entries
    pub fn with_max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Restrict plugin loading to the given names
    pub fn with_enabled_plugins<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.enabled_plugins = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Exclude the given plugin names
    pub fn with_disabled_plugins<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.disabled_plugins = names.into_iter().map(Into::into).collect();
        self
    }

    /// Cache timeout as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    /// Whether a plugin with this name should be loaded
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        match &self.enabled_plugins {
            Some(enabled) => enabled.iter().any(|p| p == name),
            None => !self.disabled_plugins.iter().any(|p| p == name),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_cache_entries == 0 {
            return Err(StratagemError::InvalidConfig {
                reason: "max_cache_entries must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
