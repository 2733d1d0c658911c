#![forbid(unsafe_code)]

//! Platform-independent shell core.
//!
//! Everything the `wasm-bindgen` exports do apart from touching the DOM:
//! decoding pop state, decoding open requests, mapping clicks to activations
//! and shaping results as JSON. Generic over the backend so native tests run
//! it against the headless one.

use navstack_core::{HistoryRecord, OverlayId, OverlaySpec, Route, ShellBackend};
use navstack_runtime::{Activation, ConfirmFuture, HistoryBridge, PopOutcome};
use serde_json::{Value, json};

use crate::config::WebShellConfig;
use crate::markup::{ClickIntent, parse_click};

/// Decode history state text into a record.
///
/// Undecodable or unrecognised state is treated as an entry without a record.
#[must_use]
pub fn decode_state(state: Option<&str>) -> Option<HistoryRecord> {
    let text = state?;
    match HistoryRecord::from_json(text) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, "history state not decodable; treating as absent");
            None
        }
    }
}

/// JSON shape of a [`PopOutcome`].
#[must_use]
pub fn pop_outcome_json(outcome: &PopOutcome) -> Value {
    match outcome {
        PopOutcome::ClosedOverlay(id) => json!({ "type": "closed_overlay", "id": id }),
        PopOutcome::StaleOverlay => json!({ "type": "stale_overlay" }),
        PopOutcome::RouteRestored { route, closed } => {
            json!({ "type": "route_restored", "route": route.as_str(), "closed": closed })
        }
    }
}

/// JSON shape of an [`Activation`].
#[must_use]
pub fn activation_json(activation: &Activation) -> Value {
    match activation {
        Activation::Dismissed(id) => json!({ "type": "dismissed", "id": id }),
        Activation::Confirmed { id, choice } => {
            json!({ "type": "confirmed", "id": id, "choice": choice })
        }
        Activation::Action { id, tag } => {
            json!({ "type": "action", "id": id, "tag": tag.as_str() })
        }
        Activation::Ignored => json!({ "type": "ignored" }),
    }
}

/// The bridge plus the browser-facing configuration.
#[derive(Debug)]
pub struct ShellCore<B: ShellBackend> {
    bridge: HistoryBridge<B>,
    config: WebShellConfig,
}

impl<B: ShellBackend> ShellCore<B> {
    #[must_use]
    pub fn new(backend: B, config: WebShellConfig) -> Self {
        let bridge = HistoryBridge::new(backend, config.shell.clone());
        Self { bridge, config }
    }

    pub fn start(&mut self) -> Route {
        self.bridge.start()
    }

    /// Open from a JSON [`OverlaySpec`].
    pub fn open_json(&mut self, spec: &str) -> Result<OverlayId, serde_json::Error> {
        let spec: OverlaySpec = serde_json::from_str(spec)?;
        Ok(self.bridge.open(spec))
    }

    pub fn confirm(&mut self, title: &str, message: &str) -> ConfirmFuture {
        self.bridge
            .confirm(navstack_core::ConfirmSpec::new(title, message))
    }

    /// Handle a click on overlay `id` whose target carries `action` / `index`.
    pub fn click(&mut self, id: &str, action: Option<&str>, index: Option<&str>) -> Activation {
        let id = OverlayId::new(id);
        match parse_click(action, index) {
            Some(ClickIntent::Dismiss) => self.bridge.dismiss(&id),
            Some(ClickIntent::Button(index)) => self.bridge.activate(&id, index),
            None => Activation::Ignored,
        }
    }

    /// Host pop with the raw state text now current.
    pub fn pop(&mut self, state: Option<&str>) -> PopOutcome {
        let record = decode_state(state);
        self.bridge.handle_pop(record)
    }

    /// Debug snapshot as JSON text.
    #[must_use]
    pub fn snapshot_json(&self) -> String {
        self.bridge.snapshot().to_json()
    }

    #[must_use]
    pub fn bridge(&self) -> &HistoryBridge<B> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut HistoryBridge<B> {
        &mut self.bridge
    }

    #[must_use]
    pub fn config(&self) -> &WebShellConfig {
        &self.config
    }
}
