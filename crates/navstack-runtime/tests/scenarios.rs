#![forbid(unsafe_code)]

//! End-to-end scenarios for the history bridge.
//!
//! Scenarios A-D drive `handle_pop` with explicit records, the way a host pop
//! delivers them. The remaining tests use the simulated history so pops carry
//! whatever record really became current.
//!
//! Run:
//!   cargo test -p navstack-runtime --test scenarios

use std::pin::pin;
use std::task::{Context, Poll, Waker};

use navstack_core::{
    ConfirmSpec, HistoryRecord, HostHistory, OverlayButton, OverlayId, OverlaySpec, Route,
    ShellConfig, StartupEntry,
};
use navstack_runtime::{
    Activation, HistoryBridge, HeadlessBackend, MemoryStorage, PopOutcome, RenderEvent,
    ShellSimulator, SurfaceEvent,
};
use pretty_assertions::assert_eq;

fn overlay_record(id: &str) -> Option<HistoryRecord> {
    Some(HistoryRecord::overlay(OverlayId::new(id), 0))
}

fn route_record(name: &str) -> Option<HistoryRecord> {
    Some(HistoryRecord::route(Route::new(name), 0))
}

fn started(storage: MemoryStorage) -> HistoryBridge<HeadlessBackend> {
    let mut bridge = HistoryBridge::new(
        HeadlessBackend::with_storage(storage),
        ShellConfig::default(),
    );
    bridge.start();
    bridge
}

// ============================================================================
// Scenarios A-D
// ============================================================================

#[test]
fn scenario_a_single_overlay_closed_by_pop() {
    let mut bridge = started(MemoryStorage::new());
    bridge.open(OverlaySpec::new("Appointments").id("m1"));
    assert_eq!(bridge.count(), 1);
    assert!(bridge.is_open());

    let outcome = bridge.handle_pop(overlay_record("m1"));
    assert_eq!(outcome, PopOutcome::ClosedOverlay(OverlayId::new("m1")));
    assert!(!bridge.is_open());
}

#[test]
fn scenario_b_nested_overlays_close_in_reverse_order() {
    let mut bridge = started(MemoryStorage::new());
    bridge.open(OverlaySpec::new("Client").id("m1"));
    bridge.open(OverlaySpec::new("Edit").id("m2"));

    // A host pop from m2 lands on m1's record.
    bridge.handle_pop(overlay_record("m1"));
    assert_eq!(bridge.peek_top().map(|e| e.id.as_str()), Some("m1"));

    bridge.handle_pop(overlay_record("m1"));
    assert_eq!(bridge.count(), 0);
}

#[test]
fn scenario_c_route_pop_restores_page_without_overlay_work() {
    let storage = MemoryStorage::with_value("navstack:route", "dashboard");
    let mut bridge = started(storage);
    assert!(bridge.navigate("finance"));
    assert_eq!(bridge.backend().storage.peek("navstack:route"), Some("finance"));

    let surface_before = bridge.backend().surface.events().len();
    bridge.backend_mut().renderer.clear();

    let outcome = bridge.handle_pop(route_record("dashboard"));
    assert_eq!(
        outcome,
        PopOutcome::RouteRestored {
            route: Route::new("dashboard"),
            closed: 0
        }
    );
    assert_eq!(bridge.backend().renderer.rendered(), vec![Route::new("dashboard")]);
    assert_eq!(bridge.backend().storage.peek("navstack:route"), Some("dashboard"));
    assert_eq!(bridge.backend().surface.events().len(), surface_before);
    assert_eq!(bridge.current_route(), Some(&Route::new("dashboard")));
}

#[test]
fn scenario_d_pop_onto_stale_overlay_record_is_noop() {
    let mut bridge = started(MemoryStorage::new());
    bridge.open(OverlaySpec::new("A").id("m1"));
    assert!(bridge.close(Some(&OverlayId::new("m1"))));
    assert!(!bridge.is_open());
    assert_eq!(
        bridge
            .backend()
            .history
            .current()
            .and_then(|r| r.overlay_id().cloned()),
        Some(OverlayId::new("m1")),
        "record stays ahead in host history"
    );

    let pushes = bridge.forward_pushes();
    let outcome = bridge.handle_pop(overlay_record("m1"));
    assert_eq!(outcome, PopOutcome::StaleOverlay);
    assert_eq!(bridge.forward_pushes(), pushes);
    assert_eq!(bridge.current_route(), Some(&Route::new("dashboard")));
}

// ============================================================================
// Simulated host history
// ============================================================================

#[test]
fn n_overlays_unwind_before_route_changes() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().navigate("clients");
    for i in 0..4 {
        sim.bridge_mut().open(OverlaySpec::new(format!("m{i}")));
    }

    for expected in (1..4).rev() {
        let outcome = sim.back();
        assert_eq!(
            outcome,
            Some(PopOutcome::ClosedOverlay(OverlayId::new(format!(
                "overlay_{}",
                expected + 1
            ))))
        );
        assert_eq!(sim.bridge().current_route(), Some(&Route::new("clients")));
    }

    let outcome = sim.back();
    assert_eq!(
        outcome,
        Some(PopOutcome::RouteRestored {
            route: Route::new("clients"),
            closed: 1
        })
    );
    assert!(!sim.bridge().is_open());

    let outcome = sim.back();
    assert_eq!(
        outcome,
        Some(PopOutcome::RouteRestored {
            route: Route::new("dashboard"),
            closed: 0
        })
    );
}

#[test]
fn undo_never_pushes() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("A"));
    sim.bridge_mut().open(OverlaySpec::new("B"));
    let pushes = sim.bridge().forward_pushes();
    let len = sim.backend().history.len();

    while sim.back().is_some() {}

    assert_eq!(sim.bridge().forward_pushes(), pushes);
    assert_eq!(sim.backend().history.len(), len);
}

#[test]
fn forward_onto_overlay_record_does_not_reopen() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("A").id("m1"));
    sim.back();
    assert!(!sim.bridge().is_open());

    let outcome = sim.forward();
    assert_eq!(outcome, Some(PopOutcome::StaleOverlay));
    assert!(!sim.bridge().is_open());
}

#[test]
fn navigate_is_blocked_while_overlay_open() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("A"));
    let pushes = sim.bridge().forward_pushes();

    assert!(!sim.bridge_mut().navigate("finance"));
    assert_eq!(sim.bridge().forward_pushes(), pushes);
    assert_eq!(sim.bridge().current_route(), Some(&Route::new("dashboard")));
}

#[test]
fn switch_route_closes_overlays_then_navigates() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("A"));
    sim.bridge_mut().open(OverlaySpec::new("B"));

    assert!(sim.bridge_mut().switch_route("services"));
    assert!(!sim.bridge().is_open());
    assert_eq!(sim.bridge().current_route(), Some(&Route::new("services")));
    assert_eq!(
        sim.backend().history.current().and_then(|r| r.route_name().cloned()),
        Some(Route::new("services"))
    );
}

#[test]
fn route_pop_closes_stragglers_before_rendering() {
    let mut bridge = started(MemoryStorage::new());
    bridge.open(OverlaySpec::new("A"));
    bridge.open(OverlaySpec::new("B"));

    let outcome = bridge.handle_pop(None);
    assert_eq!(
        outcome,
        PopOutcome::RouteRestored {
            route: Route::new("dashboard"),
            closed: 2
        }
    );
    let hide = bridge
        .backend()
        .surface
        .events()
        .iter()
        .filter(|e| matches!(e, SurfaceEvent::HideChrome))
        .count();
    assert_eq!(hide, 1);
}

#[test]
fn route_pop_with_empty_name_uses_default() {
    let config = ShellConfig::new().default_route("home").route("home", "Home");
    let mut bridge = HistoryBridge::new(HeadlessBackend::new(), config);
    bridge.start();
    bridge.navigate("finance");

    let outcome = bridge.handle_pop(route_record(""));
    assert_eq!(
        outcome,
        PopOutcome::RouteRestored {
            route: Route::new("home"),
            closed: 0
        }
    );
    assert_eq!(
        bridge.backend().renderer.active(),
        Some((&Route::new("home"), "Home"))
    );
}

// ============================================================================
// Startup and persistence
// ============================================================================

#[test]
fn startup_uses_persisted_route() {
    let bridge = started(MemoryStorage::with_value("navstack:route", "finance"));
    assert_eq!(bridge.current_route(), Some(&Route::new("finance")));
    assert_eq!(bridge.backend().renderer.rendered(), vec![Route::new("finance")]);
}

#[test]
fn startup_survives_unreadable_storage() {
    let mut storage = MemoryStorage::with_value("navstack:route", "finance");
    storage.fail_reads(Some(navstack_core::StorageError::Unavailable));
    let bridge = started(storage);
    assert_eq!(bridge.current_route(), Some(&Route::new("dashboard")));
}

#[test]
fn startup_replace_does_not_grow_history() {
    let config = ShellConfig::default().startup_entry(StartupEntry::Replace);
    let mut bridge = HistoryBridge::new(HeadlessBackend::new(), config);
    bridge.start();
    assert_eq!(bridge.backend().history.len(), 1);
    assert_eq!(bridge.forward_pushes(), 0);
}

#[test]
fn navigate_survives_write_failures() {
    let mut bridge = started(MemoryStorage::new());
    bridge
        .backend_mut()
        .storage
        .fail_writes(Some(navstack_core::StorageError::QuotaExceeded));
    assert!(bridge.navigate("finance"));
    assert_eq!(bridge.current_route(), Some(&Route::new("finance")));
}

#[test]
fn navigate_orders_markers_before_render() {
    let config = ShellConfig::new()
        .route("dashboard", "Dashboard")
        .route("finance", "Finance");
    let mut bridge = HistoryBridge::new(HeadlessBackend::new(), config);
    bridge.start();
    bridge.backend_mut().renderer.clear();

    bridge.navigate("finance");
    assert_eq!(
        bridge.backend().renderer.events(),
        &[
            RenderEvent::MarkActive {
                route: Route::new("finance"),
                title: "Finance".into()
            },
            RenderEvent::Render(Route::new("finance")),
            RenderEvent::Bind(Route::new("finance")),
        ]
    );
}

// ============================================================================
// Confirm dialogs and activation
// ============================================================================

fn poll_once(fut: &mut navstack_runtime::ConfirmFuture) -> Poll<bool> {
    let mut cx = Context::from_waker(Waker::noop());
    std::future::Future::poll(pin!(fut), &mut cx)
}

#[test]
fn confirm_resolves_with_chosen_button() {
    let mut bridge = started(MemoryStorage::new());
    let mut fut = bridge.confirm(ConfirmSpec::new("Delete", "Delete client?"));
    let id = fut.overlay_id().clone();
    assert_eq!(poll_once(&mut fut), Poll::Pending);

    let activation = bridge.activate(&id, 1);
    assert_eq!(
        activation,
        Activation::Confirmed {
            id: id.clone(),
            choice: true
        }
    );
    assert_eq!(poll_once(&mut fut), Poll::Ready(true));
    assert!(!bridge.is_open());
    assert!(!bridge.is_undoing());
}

#[test]
fn confirm_cancel_button_resolves_false() {
    let mut bridge = started(MemoryStorage::new());
    let mut fut = bridge.confirm(ConfirmSpec::new("Delete", "Sure?"));
    let id = fut.overlay_id().clone();
    bridge.activate(&id, 0);
    assert_eq!(poll_once(&mut fut), Poll::Ready(false));
}

#[test]
fn confirm_closed_by_back_resolves_false() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("Client"));
    let mut fut = sim
        .bridge_mut()
        .confirm(ConfirmSpec::new("Discard", "Discard changes?"));

    assert!(matches!(sim.back(), Some(PopOutcome::ClosedOverlay(_))));
    assert_eq!(poll_once(&mut fut), Poll::Ready(false));
    assert_eq!(sim.bridge().count(), 1);
}

#[test]
fn confirm_below_top_is_ignored() {
    let mut bridge = started(MemoryStorage::new());
    let mut fut = bridge.confirm(ConfirmSpec::new("Delete", "Sure?"));
    let id = fut.overlay_id().clone();
    bridge.open(OverlaySpec::new("Help"));

    assert_eq!(bridge.activate(&id, 1), Activation::Ignored);
    assert_eq!(bridge.count(), 2);
    assert_eq!(poll_once(&mut fut), Poll::Pending);
}

#[test]
fn dismiss_button_closes_without_unwinding_history() {
    let mut bridge = started(MemoryStorage::new());
    let id = bridge.open(OverlaySpec::new("A").button(OverlayButton::dismiss("Close")));
    let len = bridge.backend().history.len();

    assert_eq!(bridge.activate(&id, 0), Activation::Dismissed(id.clone()));
    assert!(!bridge.is_open());
    assert_eq!(bridge.backend().history.len(), len);
    assert_eq!(bridge.dismiss(&id), Activation::Ignored);
}

// ============================================================================
// Teardown timing
// ============================================================================

#[test]
fn queries_see_close_before_teardown() {
    let mut sim = ShellSimulator::new();
    let id = sim.bridge_mut().open(OverlaySpec::new("A"));
    sim.bridge_mut().close(Some(&id));

    assert!(!sim.bridge().is_open());
    assert_eq!(sim.backend().surface.mounted_count(), 1);
    assert_eq!(
        sim.bridge().next_teardown_in(),
        Some(std::time::Duration::from_millis(200))
    );
    sim.advance(200);
    assert_eq!(sim.backend().surface.mounted_count(), 0);
}

#[test]
fn snapshot_reports_state() {
    let mut sim = ShellSimulator::new();
    sim.bridge_mut().open(OverlaySpec::new("A").id("m1"));
    sim.bridge_mut().open(OverlaySpec::new("B").id("m2"));

    let snapshot = sim.bridge().snapshot();
    assert_eq!(
        snapshot.overlays,
        vec![OverlayId::new("m1"), OverlayId::new("m2")]
    );
    assert_eq!(snapshot.route, Some(Route::new("dashboard")));
    assert_eq!(snapshot.forward_pushes, 3);
    assert!(!snapshot.undoing);

    let json: serde_json::Value = serde_json::from_str(&snapshot.to_json()).unwrap();
    assert_eq!(json["current_record"]["kind"], "overlay");
    assert_eq!(json["current_record"]["overlayId"], "m2");
}
