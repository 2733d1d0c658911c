#![forbid(unsafe_code)]

//! Headless backend: in-memory history, surface, renderer and storage.
//!
//! Used by tests and by [`crate::ShellSimulator`]. Every collaborator records
//! what was asked of it so tests can assert on side effects.
//!
//! [`SimulatedHistory`] models the host's linear history faithfully: `push`
//! drops forward entries, `back` / `forward` move the cursor and return the
//! record that became current, which is exactly what a host pop delivers.

use std::collections::{BTreeSet, HashMap};

use navstack_core::{
    DeterministicClock, HistoryRecord, HostHistory, KeyValueStore, MountHandle, OverlayId,
    OverlaySpec, OverlaySurface, PageRenderer, Route, ShellBackend, StorageError,
};

// ============================================================================
// History
// ============================================================================

/// Linear, append-only navigation history with a cursor.
#[derive(Debug, Clone)]
pub struct SimulatedHistory {
    /// Entry 0 is the page-load entry and carries no record.
    entries: Vec<Option<HistoryRecord>>,
    cursor: usize,
    pushes: u64,
}

impl Default for SimulatedHistory {
    fn default() -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
            pushes: 0,
        }
    }
}

impl SimulatedHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move one entry back. Returns the new current record (the pop payload),
    /// or `None` when already at the first entry (no pop fires).
    pub fn back(&mut self) -> Option<Option<HistoryRecord>> {
        self.go(-1)
    }

    /// Move one entry forward; see [`Self::back`].
    pub fn forward(&mut self) -> Option<Option<HistoryRecord>> {
        self.go(1)
    }

    /// Move `delta` entries. Out-of-range moves do nothing and return `None`.
    pub fn go(&mut self, delta: isize) -> Option<Option<HistoryRecord>> {
        if delta == 0 {
            return None;
        }
        let target = self.cursor.checked_add_signed(delta)?;
        if target >= self.entries.len() {
            return None;
        }
        self.cursor = target;
        Some(self.entries[target].clone())
    }

    /// Total number of entries, including the page-load entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of forward entries ahead of the cursor.
    #[must_use]
    pub fn forward_len(&self) -> usize {
        self.entries.len() - self.cursor - 1
    }

    /// Number of `push` calls observed.
    #[must_use]
    pub fn push_count(&self) -> u64 {
        self.pushes
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Option<HistoryRecord>] {
        &self.entries
    }
}

impl HostHistory for SimulatedHistory {
    fn push(&mut self, record: &HistoryRecord) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(record.clone()));
        self.cursor += 1;
        self.pushes += 1;
    }

    fn replace(&mut self, record: &HistoryRecord) {
        self.entries[self.cursor] = Some(record.clone());
    }

    fn current(&self) -> Option<HistoryRecord> {
        self.entries[self.cursor].clone()
    }
}

// ============================================================================
// Surface
// ============================================================================

/// One call observed by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    ShowChrome,
    HideChrome,
    Mount { handle: MountHandle, id: OverlayId },
    BeginExit(MountHandle),
    Unmount(MountHandle),
}

/// Overlay surface that records calls and tracks mounted handles.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    events: Vec<SurfaceEvent>,
    mounted: BTreeSet<MountHandle>,
    chrome_visible: bool,
}

impl RecordingSurface {
    #[must_use]
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    #[must_use]
    pub fn is_mounted(&self, handle: MountHandle) -> bool {
        self.mounted.contains(&handle)
    }

    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    #[must_use]
    pub fn chrome_visible(&self) -> bool {
        self.chrome_visible
    }
}

impl OverlaySurface for RecordingSurface {
    fn show_chrome(&mut self) {
        self.chrome_visible = true;
        self.events.push(SurfaceEvent::ShowChrome);
    }

    fn hide_chrome(&mut self) {
        self.chrome_visible = false;
        self.events.push(SurfaceEvent::HideChrome);
    }

    fn mount(&mut self, handle: MountHandle, id: &OverlayId, _spec: &OverlaySpec) {
        self.mounted.insert(handle);
        self.events.push(SurfaceEvent::Mount {
            handle,
            id: id.clone(),
        });
    }

    fn begin_exit(&mut self, handle: MountHandle) {
        self.events.push(SurfaceEvent::BeginExit(handle));
    }

    fn unmount(&mut self, handle: MountHandle) {
        self.mounted.remove(&handle);
        self.events.push(SurfaceEvent::Unmount(handle));
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// One call observed by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Render(Route),
    Bind(Route),
    MarkActive { route: Route, title: String },
}

/// Page renderer that records calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    #[must_use]
    pub fn events(&self) -> &[RenderEvent] {
        &self.events
    }

    /// Routes painted, in order.
    #[must_use]
    pub fn rendered(&self) -> Vec<Route> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Render(route) => Some(route.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent active-route marker.
    #[must_use]
    pub fn active(&self) -> Option<(&Route, &str)> {
        self.events.iter().rev().find_map(|e| match e {
            RenderEvent::MarkActive { route, title } => Some((route, title.as_str())),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl PageRenderer for RecordingRenderer {
    fn render(&mut self, route: &Route) {
        self.events.push(RenderEvent::Render(route.clone()));
    }

    fn bind(&mut self, route: &Route) {
        self.events.push(RenderEvent::Bind(route.clone()));
    }

    fn mark_active(&mut self, route: &Route, title: &str) {
        self.events.push(RenderEvent::MarkActive {
            route: route.clone(),
            title: title.to_owned(),
        });
    }
}

// ============================================================================
// Storage
// ============================================================================

/// In-memory key-value store with injectable failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: HashMap<String, String>,
    read_error: Option<StorageError>,
    write_error: Option<StorageError>,
    writes: u64,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one value.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut storage = Self::default();
        storage.data.insert(key.to_owned(), value.to_owned());
        storage
    }

    /// Make every subsequent read fail with `err` (`None` to heal).
    pub fn fail_reads(&mut self, err: Option<StorageError>) {
        self.read_error = err;
    }

    /// Make every subsequent write fail with `err` (`None` to heal).
    pub fn fail_writes(&mut self, err: Option<StorageError>) {
        self.write_error = err;
    }

    /// Raw value, bypassing injected failures.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if let Some(err) = &self.read_error {
            return Err(err.clone());
        }
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(err) = &self.write_error {
            return Err(err.clone());
        }
        self.data.insert(key.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Headless [`ShellBackend`] built from the recording collaborators.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    pub clock: DeterministicClock,
    pub history: SimulatedHistory,
    pub surface: RecordingSurface,
    pub renderer: RecordingRenderer,
    pub storage: MemoryStorage,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose storage starts with `storage`.
    #[must_use]
    pub fn with_storage(storage: MemoryStorage) -> Self {
        Self {
            storage,
            ..Self::default()
        }
    }
}

impl ShellBackend for HeadlessBackend {
    type Clock = DeterministicClock;
    type History = SimulatedHistory;
    type Surface = RecordingSurface;
    type Renderer = RecordingRenderer;
    type Store = MemoryStorage;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn history_mut(&mut self) -> &mut Self::History {
        &mut self.history
    }

    fn surface_mut(&mut self) -> &mut Self::Surface {
        &mut self.surface
    }

    fn renderer_mut(&mut self) -> &mut Self::Renderer {
        &mut self.renderer
    }

    fn store(&self) -> &Self::Store {
        &self.storage
    }

    fn store_mut(&mut self) -> &mut Self::Store {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str) -> HistoryRecord {
        HistoryRecord::route(Route::new(name), 0)
    }

    #[test]
    fn history_starts_with_empty_entry() {
        let history = SimulatedHistory::new();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), None);
        assert!(history.clone().back().is_none());
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = SimulatedHistory::new();
        history.push(&route("a"));
        history.push(&route("b"));
        assert_eq!(history.back(), Some(Some(route("a"))));
        assert_eq!(history.forward_len(), 1);

        history.push(&route("c"));
        assert_eq!(history.forward_len(), 0);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(route("c")));
    }

    #[test]
    fn back_to_initial_entry_delivers_none() {
        let mut history = SimulatedHistory::new();
        history.push(&route("a"));
        assert_eq!(history.back(), Some(None));
        assert_eq!(history.forward(), Some(Some(route("a"))));
        assert!(history.forward().is_none());
    }

    #[test]
    fn replace_overwrites_current_without_growing() {
        let mut history = SimulatedHistory::new();
        history.replace(&route("a"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.push_count(), 0);
        assert_eq!(history.current(), Some(route("a")));
    }

    #[test]
    fn go_out_of_range_is_ignored() {
        let mut history = SimulatedHistory::new();
        history.push(&route("a"));
        assert!(history.go(-5).is_none());
        assert!(history.go(3).is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn memory_storage_failures_are_injectable() {
        let mut storage = MemoryStorage::with_value("k", "v");
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.fail_reads(Some(StorageError::Corrupt("x".into())));
        assert!(storage.get("k").is_err());
        storage.fail_writes(Some(StorageError::QuotaExceeded));
        assert_eq!(storage.set("k", "w"), Err(StorageError::QuotaExceeded));
        assert_eq!(storage.peek("k"), Some("v"));
        assert_eq!(storage.write_count(), 0);
    }
}
