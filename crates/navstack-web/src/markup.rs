#![forbid(unsafe_code)]

//! Overlay markup and click decoding.
//!
//! ```text
//! <div class="modal" data-overlay-id="…" data-mount="…">
//!   <div class="modal-header">
//!     <h3 class="modal-title">title</h3>
//!     <button class="modal-close" data-action="close">×</button>
//!   </div>
//!   <div class="modal-body">body markup</div>
//!   <div class="modal-footer">
//!     <button class="btn btn-secondary" data-action="button" data-index="0">…</button>
//!   </div>
//! </div>
//! ```
//!
//! Title, labels, ids and classes are escaped. The body is trusted markup and
//! is inserted as-is. The footer is omitted when there are no buttons.

use core::fmt::Write as _;

use navstack_core::{MountHandle, OverlayId, OverlaySpec, escape_html};

/// Class added to a mounted overlay once it is visible.
pub const OPEN_CLASS: &str = "is-open";

/// Inner HTML of one overlay element.
#[must_use]
pub fn overlay_inner_html(spec: &OverlaySpec) -> String {
    let mut html = String::with_capacity(256 + spec.body_markup.len());
    html.push_str("<div class=\"modal-header\">");
    let _ = write!(
        html,
        "<h3 class=\"modal-title\">{}</h3>",
        escape_html(&spec.title)
    );
    html.push_str("<button class=\"modal-close\" data-action=\"close\">×</button>");
    html.push_str("</div>");
    let _ = write!(html, "<div class=\"modal-body\">{}</div>", spec.body_markup);

    if !spec.buttons.is_empty() {
        html.push_str("<div class=\"modal-footer\">");
        for (index, button) in spec.buttons.iter().enumerate() {
            let _ = write!(
                html,
                "<button class=\"btn {}\" data-action=\"button\" data-index=\"{index}\">{}</button>",
                escape_html(&button.style_class),
                escape_html(&button.label)
            );
        }
        html.push_str("</div>");
    }
    html
}

/// Full element markup, used where the host inserts HTML strings.
#[must_use]
pub fn overlay_html(handle: MountHandle, id: &OverlayId, spec: &OverlaySpec) -> String {
    format!(
        "<div class=\"modal\" data-overlay-id=\"{}\" data-mount=\"{}\">{}</div>",
        escape_html(id.as_str()),
        handle.get(),
        overlay_inner_html(spec)
    )
}

/// What a click inside an overlay asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickIntent {
    /// The close affordance.
    Dismiss,
    /// Footer button at this index.
    Button(usize),
}

/// Decode the `data-action` / `data-index` attributes of a clicked element.
#[must_use]
pub fn parse_click(action: Option<&str>, index: Option<&str>) -> Option<ClickIntent> {
    match action? {
        "close" => Some(ClickIntent::Dismiss),
        "button" => index?.trim().parse().ok().map(ClickIntent::Button),
        _ => None,
    }
}
