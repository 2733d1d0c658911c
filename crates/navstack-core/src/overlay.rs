#![forbid(unsafe_code)]

//! Overlay open requests and the entries they become.
//!
//! Buttons carry an explicit [`OverlayAction`] instead of a captured closure,
//! so activation is a plain value the registry can route:
//!
//! - [`OverlayAction::Dismiss`] closes the overlay the button belongs to.
//! - [`OverlayAction::Confirm`] resolves a confirmation dialog.
//! - [`OverlayAction::App`] hands an [`ActionTag`] back to the application,
//!   which decides what to do (save a form, open a nested overlay, ...).

use core::time::Duration;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::MountHandle;
use crate::id::OverlayId;

/// Default style class for buttons that do not pick one.
pub const DEFAULT_BUTTON_CLASS: &str = "btn-secondary";
/// Style class for the primary button of a dialog.
pub const PRIMARY_BUTTON_CLASS: &str = "btn-primary";

/// Application-defined action name reported when a button is activated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTag(String);

impl ActionTag {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happens when a button is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OverlayAction {
    /// Close the owning overlay (UI-initiated close; history is not unwound).
    Dismiss,
    /// Resolve the owning confirmation dialog with this choice.
    Confirm(bool),
    /// Report the tag to the application; the overlay stays open.
    App(ActionTag),
}

/// One footer button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayButton {
    pub label: String,
    #[serde(default = "default_button_class")]
    pub style_class: String,
    pub action: OverlayAction,
}

fn default_button_class() -> String {
    DEFAULT_BUTTON_CLASS.to_owned()
}

impl OverlayButton {
    /// Create a button with the default style class.
    #[must_use]
    pub fn new(label: impl Into<String>, action: OverlayAction) -> Self {
        Self {
            label: label.into(),
            style_class: default_button_class(),
            action,
        }
    }

    /// Button that reports `tag` to the application.
    #[must_use]
    pub fn app(label: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(label, OverlayAction::App(ActionTag::new(tag)))
    }

    /// Button that dismisses its overlay.
    #[must_use]
    pub fn dismiss(label: impl Into<String>) -> Self {
        Self::new(label, OverlayAction::Dismiss)
    }

    /// Set the style class.
    #[must_use]
    pub fn style(mut self, class: impl Into<String>) -> Self {
        self.style_class = class.into();
        self
    }

    /// Use the primary style class.
    #[must_use]
    pub fn primary(self) -> Self {
        self.style(PRIMARY_BUTTON_CLASS)
    }
}

/// Request to open an overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySpec {
    /// Caller-chosen id; generated when absent.
    pub id: Option<OverlayId>,
    pub title: String,
    /// Trusted markup placed in the overlay body as-is.
    pub body_markup: String,
    pub buttons: Vec<OverlayButton>,
}

impl OverlaySpec {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<OverlayId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn body(mut self, markup: impl Into<String>) -> Self {
        self.body_markup = markup.into();
        self
    }

    #[must_use]
    pub fn button(mut self, button: OverlayButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Request to open a two-button confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmSpec {
    pub title: String,
    /// Plain text; escaped before it is placed in the body.
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Default for ConfirmSpec {
    fn default() -> Self {
        Self {
            title: String::new(),
            message: String::new(),
            confirm_label: "Confirm".to_owned(),
            cancel_label: "Cancel".to_owned(),
        }
    }
}

impl ConfirmSpec {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    /// Expand into an overlay spec: cancel first, confirm (primary) second.
    #[must_use]
    pub fn into_overlay(self) -> OverlaySpec {
        OverlaySpec::new(self.title)
            .body(format!(
                "<p class=\"confirm-message\">{}</p>",
                escape_html(&self.message)
            ))
            .button(OverlayButton::new(
                self.cancel_label,
                OverlayAction::Confirm(false),
            ))
            .button(OverlayButton::new(self.confirm_label, OverlayAction::Confirm(true)).primary())
    }
}

/// One open overlay.
///
/// The entry exclusively owns its mount; once it leaves the stack the mount is
/// torn down after the exit delay, independently of any later mount that may
/// reuse the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub id: OverlayId,
    pub title: String,
    pub body_markup: String,
    pub buttons: Vec<OverlayButton>,
    pub mount: MountHandle,
    /// Monotonic time the overlay opened.
    pub opened_at: Duration,
}

impl OverlayEntry {
    /// Action wired to the button at `index`.
    #[must_use]
    pub fn action(&self, index: usize) -> Option<&OverlayAction> {
        self.buttons.get(index).map(|b| &b.action)
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
