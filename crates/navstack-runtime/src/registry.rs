#![forbid(unsafe_code)]

//! Overlay registry: the ordered stack of open overlays.
//!
//! # Invariants
//!
//! 1. **Open order**: `stack` is in open order; the last entry is the top and
//!    the visually frontmost overlay.
//! 2. **Unique ids**: at most one open entry per [`OverlayId`]; `open_ids`
//!    always holds exactly the ids in `stack`.
//! 3. **Remove, then tear down**: `close` removes the entry before anything
//!    else, so `is_open` / `count` observe the post-close state immediately.
//!    The element is unmounted only once its exit delay has elapsed.
//! 4. **Chrome follows depth**: chrome is shown on the 0 → 1 transition and
//!    hidden on the 1 → 0 transition.
//!
//! The registry does not know about host history. Recording forward entries
//! and the reentrancy guard belong to [`crate::HistoryBridge`].

use core::time::Duration;
use std::collections::VecDeque;

use ahash::AHashSet;
use navstack_core::{MountHandle, OverlayEntry, OverlayId, OverlaySpec, OverlaySurface};

/// Result of [`OverlayRegistry::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new entry was pushed.
    Opened(OverlayId),
    /// An entry with the requested id is already open; nothing changed.
    AlreadyOpen(OverlayId),
}

impl OpenOutcome {
    #[must_use]
    pub fn id(&self) -> &OverlayId {
        match self {
            Self::Opened(id) | Self::AlreadyOpen(id) => id,
        }
    }

    #[must_use]
    pub fn into_id(self) -> OverlayId {
        match self {
            Self::Opened(id) | Self::AlreadyOpen(id) => id,
        }
    }
}

/// A mount waiting for its exit delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Teardown {
    handle: MountHandle,
    id: OverlayId,
    due: Duration,
}

/// Stack of open overlays plus their pending teardowns.
#[derive(Debug)]
pub struct OverlayRegistry {
    stack: Vec<OverlayEntry>,
    open_ids: AHashSet<OverlayId>,
    /// Ordered by `due`; the exit delay is constant so push order is due order.
    teardowns: VecDeque<Teardown>,
    exit_delay: Duration,
    id_prefix: String,
    next_mount: u64,
    next_generated: u64,
}

impl OverlayRegistry {
    #[must_use]
    pub fn new(exit_delay: Duration, id_prefix: impl Into<String>) -> Self {
        Self {
            stack: Vec::new(),
            open_ids: AHashSet::new(),
            teardowns: VecDeque::new(),
            exit_delay,
            id_prefix: id_prefix.into(),
            next_mount: 1,
            next_generated: 1,
        }
    }

    /// Mount `spec` and push it on top of the stack.
    pub fn open<S: OverlaySurface>(
        &mut self,
        spec: OverlaySpec,
        surface: &mut S,
        now: Duration,
    ) -> OpenOutcome {
        let id = match spec.id.clone() {
            Some(id) => id,
            None => self.generate_id(),
        };
        if self.open_ids.contains(&id) {
            tracing::warn!(overlay_id = %id, "overlay already open; ignoring duplicate open");
            return OpenOutcome::AlreadyOpen(id);
        }

        let handle = MountHandle::new(self.next_mount);
        self.next_mount += 1;

        if self.stack.is_empty() {
            surface.show_chrome();
        }
        surface.mount(handle, &id, &spec);

        self.open_ids.insert(id.clone());
        self.stack.push(OverlayEntry {
            id: id.clone(),
            title: spec.title,
            body_markup: spec.body_markup,
            buttons: spec.buttons,
            mount: handle,
            opened_at: now,
        });
        tracing::debug!(overlay_id = %id, depth = self.stack.len(), "overlay opened");
        OpenOutcome::Opened(id)
    }

    /// Close `id`, or the top entry when `id` is `None`.
    ///
    /// Returns the removed entry; `None` (and no side effects) when the stack
    /// is empty or no open entry has that id.
    pub fn close<S: OverlaySurface>(
        &mut self,
        id: Option<&OverlayId>,
        surface: &mut S,
        now: Duration,
    ) -> Option<OverlayEntry> {
        let index = match id {
            Some(id) => self.stack.iter().rposition(|entry| &entry.id == id)?,
            None => self.stack.len().checked_sub(1)?,
        };
        let entry = self.stack.remove(index);
        self.open_ids.remove(&entry.id);

        surface.begin_exit(entry.mount);
        self.teardowns.push_back(Teardown {
            handle: entry.mount,
            id: entry.id.clone(),
            due: now.saturating_add(self.exit_delay),
        });

        if self.stack.is_empty() {
            surface.hide_chrome();
        }
        tracing::debug!(overlay_id = %entry.id, depth = self.stack.len(), "overlay closed");
        Some(entry)
    }

    /// Unmount every teardown whose exit delay has elapsed by `now`.
    ///
    /// Returns the number of elements unmounted.
    pub fn flush_teardowns<S: OverlaySurface>(&mut self, surface: &mut S, now: Duration) -> usize {
        let mut flushed = 0;
        while self.teardowns.front().is_some_and(|t| t.due <= now) {
            if let Some(teardown) = self.teardowns.pop_front() {
                surface.unmount(teardown.handle);
                tracing::trace!(overlay_id = %teardown.id, mount = teardown.handle.get(), "overlay unmounted");
                flushed += 1;
            }
        }
        flushed
    }

    /// When the next pending teardown becomes due.
    #[must_use]
    pub fn next_teardown_due(&self) -> Option<Duration> {
        self.teardowns.front().map(|t| t.due)
    }

    #[must_use]
    pub fn pending_teardowns(&self) -> usize {
        self.teardowns.len()
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    #[must_use]
    pub fn peek_top(&self) -> Option<&OverlayEntry> {
        self.stack.last()
    }

    #[must_use]
    pub fn contains(&self, id: &OverlayId) -> bool {
        self.open_ids.contains(id)
    }

    #[must_use]
    pub fn get(&self, id: &OverlayId) -> Option<&OverlayEntry> {
        self.stack.iter().rev().find(|entry| &entry.id == id)
    }

    /// Open ids, bottom first.
    pub fn ids(&self) -> impl Iterator<Item = &OverlayId> + '_ {
        self.stack.iter().map(|entry| &entry.id)
    }

    #[must_use]
    pub fn exit_delay(&self) -> Duration {
        self.exit_delay
    }

    fn generate_id(&mut self) -> OverlayId {
        loop {
            let id = OverlayId::generated(&self.id_prefix, self.next_generated);
            self.next_generated += 1;
            if !self.open_ids.contains(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{RecordingSurface, SurfaceEvent};

    const DELAY: Duration = Duration::from_millis(200);

    fn registry() -> OverlayRegistry {
        OverlayRegistry::new(DELAY, "overlay")
    }

    #[test]
    fn open_generates_ids_and_shows_chrome_once() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();

        let a = reg.open(OverlaySpec::new("A"), &mut surface, Duration::ZERO);
        let b = reg.open(OverlaySpec::new("B"), &mut surface, Duration::ZERO);

        assert_eq!(a, OpenOutcome::Opened(OverlayId::new("overlay_1")));
        assert_eq!(b, OpenOutcome::Opened(OverlayId::new("overlay_2")));
        assert_eq!(reg.count(), 2);
        assert_eq!(reg.peek_top().unwrap().id, OverlayId::new("overlay_2"));
        let shows = surface
            .events()
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::ShowChrome))
            .count();
        assert_eq!(shows, 1);
    }

    #[test]
    fn generated_ids_skip_ids_already_open() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("x").id("overlay_1"), &mut surface, Duration::ZERO);
        let generated = reg.open(OverlaySpec::new("y"), &mut surface, Duration::ZERO);
        assert_eq!(generated.id(), &OverlayId::new("overlay_2"));
    }

    #[test]
    fn duplicate_id_is_rejected_without_side_effects() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        let events_before = surface.events().len();

        let again = reg.open(OverlaySpec::new("A2").id("m1"), &mut surface, Duration::ZERO);
        assert_eq!(again, OpenOutcome::AlreadyOpen(OverlayId::new("m1")));
        assert_eq!(reg.count(), 1);
        assert_eq!(surface.events().len(), events_before);
    }

    #[test]
    fn close_none_closes_top() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        reg.open(OverlaySpec::new("B").id("m2"), &mut surface, Duration::ZERO);

        let closed = reg.close(None, &mut surface, Duration::ZERO).unwrap();
        assert_eq!(closed.id, OverlayId::new("m2"));
        assert_eq!(reg.peek_top().unwrap().id, OverlayId::new("m1"));
    }

    #[test]
    fn close_by_id_can_remove_a_lower_entry() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        reg.open(OverlaySpec::new("B").id("m2"), &mut surface, Duration::ZERO);

        reg.close(Some(&OverlayId::new("m1")), &mut surface, Duration::ZERO);
        assert_eq!(reg.ids().cloned().collect::<Vec<_>>(), vec![OverlayId::new("m2")]);
        assert!(!reg.contains(&OverlayId::new("m1")));
    }

    #[test]
    fn close_on_empty_or_unknown_is_noop() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        assert!(reg.close(None, &mut surface, Duration::ZERO).is_none());
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        assert!(
            reg.close(Some(&OverlayId::new("nope")), &mut surface, Duration::ZERO)
                .is_none()
        );
        assert_eq!(reg.count(), 1);
        assert_eq!(reg.pending_teardowns(), 0);
    }

    #[test]
    fn teardown_waits_for_exit_delay() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        let handle = reg.peek_top().unwrap().mount;

        reg.close(None, &mut surface, Duration::from_millis(50));
        assert!(!reg.is_open());
        assert!(surface.is_mounted(handle), "element lingers during exit");
        assert_eq!(reg.next_teardown_due(), Some(Duration::from_millis(250)));

        assert_eq!(reg.flush_teardowns(&mut surface, Duration::from_millis(249)), 0);
        assert!(surface.is_mounted(handle));
        assert_eq!(reg.flush_teardowns(&mut surface, Duration::from_millis(250)), 1);
        assert!(!surface.is_mounted(handle));
        assert_eq!(reg.pending_teardowns(), 0);
    }

    #[test]
    fn reopen_during_exit_keeps_new_mount() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::ZERO);
        let old = reg.peek_top().unwrap().mount;
        reg.close(None, &mut surface, Duration::ZERO);

        reg.open(OverlaySpec::new("A").id("m1"), &mut surface, Duration::from_millis(10));
        let new = reg.peek_top().unwrap().mount;
        assert_ne!(old, new);

        reg.flush_teardowns(&mut surface, Duration::from_secs(1));
        assert!(!surface.is_mounted(old));
        assert!(surface.is_mounted(new));
        assert!(reg.is_open());
    }

    #[test]
    fn chrome_hidden_when_last_overlay_closes() {
        let mut reg = registry();
        let mut surface = RecordingSurface::default();
        reg.open(OverlaySpec::new("A"), &mut surface, Duration::ZERO);
        reg.open(OverlaySpec::new("B"), &mut surface, Duration::ZERO);
        reg.close(None, &mut surface, Duration::ZERO);
        assert!(surface.chrome_visible());
        reg.close(None, &mut surface, Duration::ZERO);
        assert!(!surface.chrome_visible());
    }
}
