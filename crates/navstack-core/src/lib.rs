#![forbid(unsafe_code)]

//! navstack core types.
//!
//! This crate holds everything the synchronizer and its hosts agree on:
//!
//! - [`HistoryRecord`] - the tagged entry written into host navigation history
//! - [`OverlayId`] / [`Route`] - identifiers for overlays and pages
//! - [`OverlaySpec`] / [`OverlayButton`] / [`OverlayAction`] - open requests
//! - [`ShellConfig`] - tunables (default route, exit delay, storage key, titles)
//! - [`backend`] - the trait boundary a host implements (history, surface,
//!   renderer, storage, clock)
//!
//! # Role in navstack
//! `navstack-runtime` builds the overlay registry, navigation state and
//! history bridge on top of these types. `navstack-web` implements the
//! [`backend::ShellBackend`] boundary for browsers.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod overlay;
pub mod record;

pub use backend::{
    BackendClock, HostHistory, KeyValueStore, MountHandle, OverlaySurface, PageRenderer,
    ShellBackend,
};
pub use clock::{DeterministicClock, SystemClock};
pub use config::{ShellConfig, StartupEntry};
pub use error::{ConfigError, RecordDecodeError, StorageError};
pub use id::{OverlayId, Route};
pub use overlay::{
    ActionTag, ConfirmSpec, OverlayAction, OverlayButton, OverlayEntry, OverlaySpec, escape_html,
};
pub use record::{HistoryRecord, RecordKind};
