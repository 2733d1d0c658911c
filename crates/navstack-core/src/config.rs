#![forbid(unsafe_code)]

//! Shell configuration.
//!
//! ```toml
//! default_route = "dashboard"
//! exit_animation_ms = 200
//! storage_key = "navstack:route"
//! startup_entry = "push"
//!
//! [routes]
//! dashboard = "Dashboard"
//! finance = "Finance"
//! ```
//!
//! ```rust,ignore
//! let config = ShellConfig::from_toml_file("navstack.toml")?;
//! let config = ShellConfig::from_json_str(json)?;
//! ```
//!
//! Every field has a default, so partial documents are fine.

use core::time::Duration;
use std::collections::BTreeMap;
#[cfg(feature = "config-file")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::Route;

/// How the startup route is written into host history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupEntry {
    /// Append a route entry after whatever entry the page loaded on.
    #[default]
    Push,
    /// Overwrite the entry the page loaded on.
    Replace,
}

/// Tunables for one shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Route used when nothing is persisted and when unwinding to an entry
    /// without a route.
    pub default_route: Route,
    /// Grace period between logical close and unmount.
    pub exit_animation_ms: u64,
    /// Storage key of the persisted route.
    pub storage_key: String,
    pub startup_entry: StartupEntry,
    /// Page titles by route name.
    pub routes: BTreeMap<Route, String>,
    /// Prefix for generated overlay ids.
    pub id_prefix: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_route: Route::new("dashboard"),
            exit_animation_ms: 200,
            storage_key: "navstack:route".to_owned(),
            startup_entry: StartupEntry::Push,
            routes: BTreeMap::new(),
            id_prefix: "overlay".to_owned(),
        }
    }
}

impl ShellConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn default_route(mut self, route: impl Into<Route>) -> Self {
        self.default_route = route.into();
        self
    }

    #[must_use]
    pub fn exit_animation_ms(mut self, ms: u64) -> Self {
        self.exit_animation_ms = ms;
        self
    }

    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn startup_entry(mut self, entry: StartupEntry) -> Self {
        self.startup_entry = entry;
        self
    }

    /// Register a route title.
    #[must_use]
    pub fn route(mut self, route: impl Into<Route>, title: impl Into<String>) -> Self {
        self.routes.insert(route.into(), title.into());
        self
    }

    #[must_use]
    pub fn exit_animation(&self) -> Duration {
        Duration::from_millis(self.exit_animation_ms)
    }

    /// Title for `route`, falling back to the default route's title and then
    /// to the route name itself.
    #[must_use]
    pub fn title_for<'a>(&'a self, route: &'a Route) -> &'a str {
        self.routes
            .get(route)
            .or_else(|| self.routes.get(&self.default_route))
            .map_or(route.as_str(), String::as_str)
    }

    /// `route` unless it is empty, in which case the default route.
    #[must_use]
    pub fn resolve_route(&self, route: Option<&Route>) -> Route {
        match route {
            Some(r) if !r.is_empty() => r.clone(),
            _ => self.default_route.clone(),
        }
    }

    /// Validate the configuration. An empty list means it is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.default_route.is_empty() {
            errors.push("default_route must not be empty".into());
        }
        if !self.routes.is_empty() && !self.routes.contains_key(&self.default_route) {
            errors.push(format!(
                "default_route {:?} is missing from the routes table",
                self.default_route.as_str()
            ));
        }
        if self.storage_key.is_empty() {
            errors.push("storage_key must not be empty".into());
        }
        if self.id_prefix.is_empty() {
            errors.push("id_prefix must not be empty".into());
        }
        errors
    }

    /// Fail with [`ConfigError::Invalid`] unless [`Self::validate`] is clean.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .validated()
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}
