#![forbid(unsafe_code)]

//! History bridge: keeps the overlay stack and host history in step.
//!
//! Every forward action is mirrored into host history as a tagged
//! [`HistoryRecord`]. Every host pop is interpreted against the record that
//! became current and dispatched to exactly one undo.
//!
//! # Invariants
//!
//! 1. **Depth correspondence**: with no UI-initiated closes in between, the
//!    Nth overlay from the top corresponds to the Nth most recent overlay
//!    record, so N pops close N overlays in reverse open order before any
//!    route changes.
//! 2. **No re-entrant push**: while an undo is executing (`undoing` set) no
//!    record is pushed, whatever the undo causes.
//! 3. **Route isolation**: an overlay pop never touches the route; a route pop
//!    closes every overlay before the page changes.
//! 4. **Confirm settles once**: each confirm future resolves exactly once,
//!    with `false` unless one of its confirm buttons was activated.
//!
//! # State Machine
//!
//! ```text
//!                 open (push overlay)
//!    ┌────────┐ ─────────────────────▶ ┌───────────┐
//!    │ Routed │                        │ Overlaid  │ ◀─┐ open (push)
//!    │ depth 0│ ◀───────────────────── │ depth ≥ 1 │ ──┘ pop overlay → close_top
//!    └────────┘   last close / route   └───────────┘
//!      │   ▲      pop (close_all)
//!      └───┘ navigate (push route) / route pop (render_only)
//! ```
//!
//! A UI-initiated close (dismiss button, [`HistoryBridge::close`]) leaves its
//! overlay record ahead in host history. A later pop landing on that record
//! finds the stack empty and is reported as [`PopOutcome::StaleOverlay`].

use core::time::Duration;

use ahash::AHashMap;
use navstack_core::{
    ActionTag, BackendClock, ConfirmSpec, HistoryRecord, HostHistory, OverlayAction, OverlayEntry,
    OverlayId, OverlaySpec, Route, ShellBackend, ShellConfig, StartupEntry,
};
use serde::Serialize;

use crate::confirm::{self, ConfirmFuture, ConfirmResolver};
use crate::navigation::NavigationState;
use crate::persist::RouteStore;
use crate::registry::{OpenOutcome, OverlayRegistry};

/// What a host pop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    /// Landed on an overlay record and closed the top overlay.
    ClosedOverlay(OverlayId),
    /// Landed on an overlay record with nothing open.
    StaleOverlay,
    /// Landed on a route record (or an entry with none) and restored the page.
    RouteRestored {
        route: Route,
        /// Overlays closed before the page changed.
        closed: usize,
    },
}

/// What activating a button did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The overlay was closed without a choice.
    Dismissed(OverlayId),
    /// A confirm dialog was resolved.
    Confirmed { id: OverlayId, choice: bool },
    /// An application action; the overlay stays open.
    Action { id: OverlayId, tag: ActionTag },
    /// Unknown overlay or button, or a confirm dialog that is not on top.
    Ignored,
}

/// Serializable view of the synchronizer for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot {
    /// Open overlay ids, top last.
    pub overlays: Vec<OverlayId>,
    pub undoing: bool,
    pub route: Option<Route>,
    /// Record the host reports as current.
    pub current_record: Option<HistoryRecord>,
    pub pending_teardowns: usize,
    pub forward_pushes: u64,
}

impl SyncSnapshot {
    /// Pretty JSON for logs and debug panels.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// The synchronizer: overlay stack, current route, and the reentrancy guard,
/// driving one [`ShellBackend`].
#[derive(Debug)]
pub struct HistoryBridge<B: ShellBackend> {
    backend: B,
    config: ShellConfig,
    overlays: OverlayRegistry,
    navigation: NavigationState,
    /// Set only while an undo-caused close is executing.
    undoing: bool,
    confirms: AHashMap<OverlayId, ConfirmResolver>,
    forward_pushes: u64,
}

impl<B: ShellBackend> HistoryBridge<B> {
    /// Create a bridge. Nothing is rendered or recorded until [`Self::start`].
    #[must_use]
    pub fn new(backend: B, config: ShellConfig) -> Self {
        let overlays = OverlayRegistry::new(config.exit_animation(), config.id_prefix.clone());
        let navigation = NavigationState::new(RouteStore::new(config.storage_key.clone()));
        Self {
            backend,
            config,
            overlays,
            navigation,
            undoing: false,
            confirms: AHashMap::new(),
            forward_pushes: 0,
        }
    }

    /// Enter the initial state: no overlays, persisted-or-default route.
    pub fn start(&mut self) -> Route {
        let stored = self
            .navigation
            .route_store()
            .load(self.backend.store(), &self.config.default_route);
        let route = self.config.resolve_route(Some(&stored));
        tracing::debug!(route = %route, entry = ?self.config.startup_entry, "shell starting");

        self.commit_route(&route);
        let record = HistoryRecord::route(route.clone(), self.wall_millis());
        match self.config.startup_entry {
            StartupEntry::Push => self.push_record(&record),
            StartupEntry::Replace => self.backend.history_mut().replace(&record),
        }
        self.navigation.paint(&route, self.backend.renderer_mut());
        route
    }

    // ---------------------------------------------------------------------
    // Overlays
    // ---------------------------------------------------------------------

    /// Open an overlay and return its id.
    ///
    /// Records a forward overlay entry unless an undo is executing or the id
    /// is already open.
    pub fn open(&mut self, spec: OverlaySpec) -> OverlayId {
        let now = self.now();
        match self.overlays.open(spec, self.backend.surface_mut(), now) {
            OpenOutcome::Opened(id) => {
                if self.undoing {
                    tracing::debug!(overlay_id = %id, "open during undo; not recorded");
                } else {
                    let record = HistoryRecord::overlay(id.clone(), self.wall_millis());
                    self.push_record(&record);
                }
                id
            }
            OpenOutcome::AlreadyOpen(id) => id,
        }
    }

    /// Open a two-button confirmation dialog.
    pub fn confirm(&mut self, spec: ConfirmSpec) -> ConfirmFuture {
        let id = self.open(spec.into_overlay());
        let (future, resolver) = confirm::pair(id.clone());
        self.confirms.insert(id, resolver);
        future
    }

    /// Close `id`, or the top overlay when `None`. UI-initiated: history is
    /// left as it is.
    ///
    /// Returns whether an overlay was closed.
    pub fn close(&mut self, id: Option<&OverlayId>) -> bool {
        let now = self.now();
        match self.overlays.close(id, self.backend.surface_mut(), now) {
            Some(entry) => {
                self.settle_closed(&entry);
                true
            }
            None => false,
        }
    }

    /// Close the top overlay under the reentrancy guard.
    ///
    /// `false` on an empty stack.
    pub fn close_top(&mut self) -> bool {
        self.close_top_entry().is_some()
    }

    /// Close every open overlay, top first. Returns how many closed.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        while self.close(None) {
            closed += 1;
        }
        closed
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.overlays.is_open()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.overlays.count()
    }

    #[must_use]
    pub fn peek_top(&self) -> Option<&OverlayEntry> {
        self.overlays.peek_top()
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    /// Activate the button at `index` of overlay `id`.
    pub fn activate(&mut self, id: &OverlayId, index: usize) -> Activation {
        let Some(action) = self
            .overlays
            .get(id)
            .and_then(|entry| entry.action(index))
            .cloned()
        else {
            tracing::debug!(overlay_id = %id, index, "activation ignored");
            return Activation::Ignored;
        };

        match action {
            OverlayAction::Dismiss => self.dismiss(id),
            OverlayAction::App(tag) => Activation::Action {
                id: id.clone(),
                tag,
            },
            OverlayAction::Confirm(choice) => {
                if self.overlays.peek_top().map(|top| &top.id) != Some(id) {
                    tracing::debug!(overlay_id = %id, "confirm below top; ignored");
                    return Activation::Ignored;
                }
                let resolver = self.confirms.remove(id);
                self.close_top();
                if let Some(resolver) = resolver {
                    resolver.resolve(choice);
                }
                Activation::Confirmed {
                    id: id.clone(),
                    choice,
                }
            }
        }
    }

    /// The dismiss affordance (close button) of overlay `id`.
    pub fn dismiss(&mut self, id: &OverlayId) -> Activation {
        if self.close(Some(id)) {
            Activation::Dismissed(id.clone())
        } else {
            Activation::Ignored
        }
    }

    // ---------------------------------------------------------------------
    // Routes
    // ---------------------------------------------------------------------

    /// Change page. Blocked (returns `false`) while any overlay is open or
    /// when `route` is empty.
    pub fn navigate(&mut self, route: impl Into<Route>) -> bool {
        let route = route.into();
        if route.is_empty() {
            tracing::warn!("navigate rejected empty route");
            return false;
        }
        if self.overlays.is_open() {
            tracing::warn!(
                route = %route,
                open = self.overlays.count(),
                "navigate blocked by open overlay"
            );
            return false;
        }
        self.commit_route(&route);
        let record = HistoryRecord::route(route.clone(), self.wall_millis());
        self.push_record(&record);
        self.navigation.paint(&route, self.backend.renderer_mut());
        true
    }

    /// Menu navigation: close any open overlays, then navigate.
    ///
    /// An empty route is rejected before anything closes.
    pub fn switch_route(&mut self, route: impl Into<Route>) -> bool {
        let route = route.into();
        if route.is_empty() {
            tracing::warn!("switch_route rejected empty route");
            return false;
        }
        self.close_all();
        self.navigate(route)
    }

    /// Repaint page and markers for `route` without recording or persisting.
    pub fn render_only(&mut self, route: &Route) {
        let title = self.config.title_for(route).to_owned();
        self.navigation
            .render_only(route, &title, self.backend.renderer_mut());
    }

    #[must_use]
    pub fn current_route(&self) -> Option<&Route> {
        self.navigation.current()
    }

    // ---------------------------------------------------------------------
    // Host pops
    // ---------------------------------------------------------------------

    /// Interpret a host pop whose new current entry carries `record`.
    pub fn handle_pop(&mut self, record: Option<HistoryRecord>) -> PopOutcome {
        let kind = record.as_ref().map_or("none", |r| r.kind().as_str());
        let span = tracing::debug_span!("navstack.pop", kind);
        let _guard = span.enter();

        match record {
            Some(HistoryRecord::Overlay { overlay_id, .. }) => match self.close_top_entry() {
                Some(entry) => {
                    tracing::debug!(record_id = %overlay_id, closed = %entry.id, "pop closed overlay");
                    PopOutcome::ClosedOverlay(entry.id)
                }
                None => {
                    tracing::warn!(record_id = %overlay_id, "pop landed on stale overlay record");
                    PopOutcome::StaleOverlay
                }
            },
            Some(HistoryRecord::Route { route_name, .. }) => self.restore_route(Some(&route_name)),
            None => self.restore_route(None),
        }
    }

    fn restore_route(&mut self, route: Option<&Route>) -> PopOutcome {
        let previous = self.undoing;
        self.undoing = true;
        let closed = self.close_all();
        let route = self.config.resolve_route(route);
        self.navigation.paint(&route, self.backend.renderer_mut());
        self.commit_route(&route);
        self.undoing = previous;
        tracing::debug!(route = %route, closed, "pop restored route");
        PopOutcome::RouteRestored { route, closed }
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Unmount overlays whose exit delay has elapsed. Returns how many.
    pub fn tick(&mut self) -> usize {
        let now = self.now();
        self.overlays
            .flush_teardowns(self.backend.surface_mut(), now)
    }

    /// Time until the next teardown is due, relative to the backend clock.
    #[must_use]
    pub fn next_teardown_in(&self) -> Option<Duration> {
        self.overlays
            .next_teardown_due()
            .map(|due| due.saturating_sub(self.now()))
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn is_undoing(&self) -> bool {
        self.undoing
    }

    /// Number of records pushed into host history.
    #[must_use]
    pub fn forward_pushes(&self) -> u64 {
        self.forward_pushes
    }

    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            overlays: self.overlays.ids().cloned().collect(),
            undoing: self.undoing,
            route: self.navigation.current().cloned(),
            current_record: self.backend.history().current(),
            pending_teardowns: self.overlays.pending_teardowns(),
            forward_pushes: self.forward_pushes,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn close_top_entry(&mut self) -> Option<OverlayEntry> {
        let previous = self.undoing;
        self.undoing = true;
        let now = self.now();
        let closed = self.overlays.close(None, self.backend.surface_mut(), now);
        if let Some(entry) = &closed {
            self.settle_closed(entry);
        }
        self.undoing = previous;
        closed
    }

    /// Resolve a pending confirm for a dialog that closed without a choice.
    fn settle_closed(&mut self, entry: &OverlayEntry) {
        if let Some(resolver) = self.confirms.remove(&entry.id) {
            tracing::debug!(overlay_id = %entry.id, "confirm closed without a choice");
            resolver.resolve(false);
        }
    }

    fn commit_route(&mut self, route: &Route) {
        let title = self.config.title_for(route).to_owned();
        self.navigation.commit(route, &title, &mut self.backend);
    }

    fn push_record(&mut self, record: &HistoryRecord) {
        debug_assert!(!self.undoing, "record pushed during undo");
        self.backend.history_mut().push(record);
        self.forward_pushes += 1;
        tracing::debug!(kind = record.kind().as_str(), "history push");
    }

    fn now(&self) -> Duration {
        self.backend.clock().now_mono()
    }

    fn wall_millis(&self) -> u64 {
        self.backend.clock().wall_millis()
    }
}
