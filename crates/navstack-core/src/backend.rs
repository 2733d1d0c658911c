#![forbid(unsafe_code)]

//! Backend boundary: everything the synchronizer needs from its host.
//!
//! The runtime never touches a browser API directly. It talks to:
//!
//! - [`HostHistory`] - the linear navigation history (push / replace / current)
//! - [`OverlaySurface`] - where overlays are drawn (mount / exit / unmount)
//! - [`PageRenderer`] - paints and binds a page for a route
//! - [`KeyValueStore`] - durable storage for the persisted route
//! - [`BackendClock`] - monotonic time for exit delays, wall time for records
//!
//! [`ShellBackend`] bundles one implementation of each. Concrete backends:
//! the headless one in `navstack-runtime` (tests, simulation) and the browser
//! one in `navstack-web`.
//!
//! Pop notifications are not part of this boundary: the host delivers them by
//! calling `HistoryBridge::handle_pop` with the record that is now current.

use core::time::Duration;

use crate::error::StorageError;
use crate::id::{OverlayId, Route};
use crate::overlay::OverlaySpec;
use crate::record::HistoryRecord;

/// Monotonic + wall clock.
pub trait BackendClock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;

    /// Milliseconds since the Unix epoch, used to stamp history records.
    fn wall_millis(&self) -> u64;
}

/// Host navigation history.
///
/// Only the current entry is observable. Entries before and after it can be
/// reached only by the user (or script) navigating, which the host reports as
/// a pop.
pub trait HostHistory {
    /// Append `record` after the current entry, discarding any forward entries.
    fn push(&mut self, record: &HistoryRecord);

    /// Overwrite the current entry's state.
    fn replace(&mut self, record: &HistoryRecord);

    /// State of the current entry; `None` for the entry before any push or
    /// for state we did not write.
    fn current(&self) -> Option<HistoryRecord>;
}

/// Opaque handle for one mounted overlay element.
///
/// Handles are allocated by the registry and never reused, so a teardown
/// scheduled for an old mount can never hit a newer mount of the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountHandle(u64);

impl MountHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Visual host for overlays.
pub trait OverlaySurface {
    /// Show the shared overlay chrome (backdrop). Called when the stack goes
    /// from empty to one entry.
    fn show_chrome(&mut self);

    /// Hide the shared overlay chrome. Called when the stack becomes empty.
    fn hide_chrome(&mut self);

    /// Create the visual representation of `spec` under `handle`.
    fn mount(&mut self, handle: MountHandle, id: &OverlayId, spec: &OverlaySpec);

    /// Start the exit animation; the element stays in place until `unmount`.
    fn begin_exit(&mut self, handle: MountHandle);

    /// Destroy the element. Unknown handles are ignored.
    fn unmount(&mut self, handle: MountHandle);
}

/// Page renderer collaborator.
pub trait PageRenderer {
    /// Paint the page body for `route`.
    fn render(&mut self, route: &Route);

    /// Attach page-specific listeners after `render`.
    fn bind(&mut self, route: &Route);

    /// Update active-route markers (navigation highlight, page title).
    fn mark_active(&mut self, route: &Route, title: &str);
}

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One host: clock, history, overlay surface, page renderer, and storage.
pub trait ShellBackend {
    type Clock: BackendClock;
    type History: HostHistory;
    type Surface: OverlaySurface;
    type Renderer: PageRenderer;
    type Store: KeyValueStore;

    fn clock(&self) -> &Self::Clock;

    fn history(&self) -> &Self::History;

    fn history_mut(&mut self) -> &mut Self::History;

    fn surface_mut(&mut self) -> &mut Self::Surface;

    fn renderer_mut(&mut self) -> &mut Self::Renderer;

    fn store(&self) -> &Self::Store;

    fn store_mut(&mut self) -> &mut Self::Store;
}
