#![forbid(unsafe_code)]

//! Browser shell configuration: the core [`ShellConfig`] plus DOM selectors.
//!
//! ```json
//! {
//!   "default_route": "dashboard",
//!   "routes": { "dashboard": "Dashboard", "finance": "Finance" },
//!   "dom": { "view": "#view", "nav_item": ".nav-item" }
//! }
//! ```

use navstack_core::{ConfigError, ShellConfig};
use serde::{Deserialize, Serialize};

/// Where the shell finds its elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomConfig {
    /// Backdrop that is shown while any overlay is open.
    pub overlay: String,
    /// Parent of the mounted overlay elements.
    pub container: String,
    /// Page container handed to the render callbacks.
    pub view: String,
    /// Element whose text is the page title.
    pub page_title: String,
    /// Menu root; clicks inside it switch routes.
    pub sidebar: String,
    /// Menu entries, each carrying `route_attribute`.
    pub nav_item: String,
    pub route_attribute: String,
    /// Class toggled on the active menu entry.
    pub active_class: String,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            overlay: "#modalOverlay".to_owned(),
            container: "#modalContainer".to_owned(),
            view: "#view".to_owned(),
            page_title: "#pageTitle".to_owned(),
            sidebar: "#sidebarNav".to_owned(),
            nav_item: ".nav-item".to_owned(),
            route_attribute: "data-route".to_owned(),
            active_class: "active".to_owned(),
        }
    }
}

impl DomConfig {
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let fields = [
            ("overlay", &self.overlay),
            ("container", &self.container),
            ("view", &self.view),
            ("nav_item", &self.nav_item),
            ("route_attribute", &self.route_attribute),
            ("active_class", &self.active_class),
        ];
        fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| format!("dom.{name} must not be empty"))
            .collect()
    }
}

/// Full configuration of a browser shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebShellConfig {
    #[serde(flatten)]
    pub shell: ShellConfig,
    pub dom: DomConfig,
}

impl WebShellConfig {
    /// Load from JSON; an empty string yields the defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        let mut problems = config.shell.validate();
        problems.extend(config.dom.validate());
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
