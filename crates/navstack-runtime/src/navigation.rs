#![forbid(unsafe_code)]

//! Navigation state: the single current route.
//!
//! The state itself never touches host history. [`crate::HistoryBridge`]
//! sequences the pieces: [`NavigationState::commit`] (markers + persist),
//! then the history push, then [`NavigationState::paint`].

use navstack_core::{PageRenderer, Route, ShellBackend};

use crate::persist::RouteStore;

/// Current route plus where it is persisted.
#[derive(Debug, Clone)]
pub struct NavigationState {
    current: Option<Route>,
    store: RouteStore,
}

impl NavigationState {
    #[must_use]
    pub fn new(store: RouteStore) -> Self {
        Self {
            current: None,
            store,
        }
    }

    /// Route last committed; `None` before startup.
    #[must_use]
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn route_store(&self) -> &RouteStore {
        &self.store
    }

    /// Update active-route markers, persist, and make `route` current.
    pub fn commit<B: ShellBackend>(&mut self, route: &Route, title: &str, backend: &mut B) {
        backend.renderer_mut().mark_active(route, title);
        self.store.save(backend.store_mut(), route);
        self.current = Some(route.clone());
    }

    /// Render and bind the page for `route`.
    pub fn paint<R: PageRenderer>(&self, route: &Route, renderer: &mut R) {
        renderer.render(route);
        renderer.bind(route);
    }

    /// Repaint page and markers without recording anything.
    pub fn render_only<R: PageRenderer>(&self, route: &Route, title: &str, renderer: &mut R) {
        self.paint(route, renderer);
        renderer.mark_active(route, title);
    }
}
