#![forbid(unsafe_code)]

//! navstack runtime: keeps an overlay stack in step with host history.
//!
//! # Role in navstack
//! [`HistoryBridge`] is the synchronizer. It owns the [`OverlayRegistry`],
//! the [`NavigationState`] and the reentrancy guard, and drives any
//! [`navstack_core::ShellBackend`]. Forward actions (`open`, `navigate`) push
//! tagged records; host pops go through [`HistoryBridge::handle_pop`].
//!
//! # How it fits in the system
//! `navstack-web` implements the backend for browsers and forwards
//! `popstate` into `handle_pop`. The [`headless`] backend and
//! [`ShellSimulator`] run the same bridge deterministically for tests.
//!
//! # Example
//!
//! ```
//! use navstack_core::OverlaySpec;
//! use navstack_runtime::{PopOutcome, ShellSimulator};
//!
//! let mut sim = ShellSimulator::new();
//! sim.bridge_mut().open(OverlaySpec::new("Client"));
//! let nested = sim.bridge_mut().open(OverlaySpec::new("Edit client"));
//!
//! // Back lands on the first overlay's record and closes the top one.
//! assert_eq!(sim.back(), Some(PopOutcome::ClosedOverlay(nested)));
//! assert_eq!(sim.bridge().count(), 1);
//!
//! // Back again lands on the route record; the page is restored.
//! assert!(matches!(sim.back(), Some(PopOutcome::RouteRestored { closed: 1, .. })));
//! assert!(!sim.bridge().is_open());
//! ```

pub mod bridge;
pub mod confirm;
pub mod headless;
pub mod navigation;
pub mod persist;
pub mod registry;
pub mod simulator;

pub use bridge::{Activation, HistoryBridge, PopOutcome, SyncSnapshot};
pub use confirm::ConfirmFuture;
pub use headless::{
    HeadlessBackend, MemoryStorage, RecordingRenderer, RecordingSurface, RenderEvent,
    SimulatedHistory, SurfaceEvent,
};
pub use navigation::NavigationState;
pub use persist::RouteStore;
pub use registry::{OpenOutcome, OverlayRegistry};
pub use simulator::ShellSimulator;
