#![forbid(unsafe_code)]

//! Deterministic shell driver for tests and benches.
//!
//! Wraps a [`HistoryBridge`] over a [`HeadlessBackend`] and plays the host's
//! part: `back` / `forward` move the simulated history and deliver the pop,
//! `advance` moves the clock and flushes due teardowns.

use core::time::Duration;

use navstack_core::{ShellConfig, StartupEntry};

use crate::bridge::{HistoryBridge, PopOutcome};
use crate::headless::{HeadlessBackend, MemoryStorage};

/// Host-side driver for a headless shell.
#[derive(Debug)]
pub struct ShellSimulator {
    bridge: HistoryBridge<HeadlessBackend>,
}

impl ShellSimulator {
    /// Started shell with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// Started shell with `config`.
    #[must_use]
    pub fn with_config(config: ShellConfig) -> Self {
        Self::with_storage(config, MemoryStorage::new())
    }

    /// Started shell whose storage begins as `storage`.
    #[must_use]
    pub fn with_storage(config: ShellConfig, storage: MemoryStorage) -> Self {
        let mut bridge = HistoryBridge::new(HeadlessBackend::with_storage(storage), config);
        bridge.start();
        Self { bridge }
    }

    /// Host back gesture. `None` when history is already at its first entry.
    pub fn back(&mut self) -> Option<PopOutcome> {
        let record = self.bridge.backend_mut().history.back()?;
        Some(self.bridge.handle_pop(record))
    }

    /// Host forward gesture. `None` when there is no forward entry.
    pub fn forward(&mut self) -> Option<PopOutcome> {
        let record = self.bridge.backend_mut().history.forward()?;
        Some(self.bridge.handle_pop(record))
    }

    /// Advance the clock by `ms` and flush due teardowns. Returns how many
    /// elements were unmounted.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.bridge
            .backend_mut()
            .clock
            .advance(Duration::from_millis(ms));
        self.bridge.tick()
    }

    /// Simulate a page reload: overlays are lost, storage survives.
    #[must_use]
    pub fn reload(self) -> Self {
        let config = self.bridge.config().clone();
        let storage = self.bridge.backend().storage.clone();
        Self::with_storage(config.startup_entry(StartupEntry::Replace), storage)
    }

    #[must_use]
    pub fn bridge(&self) -> &HistoryBridge<HeadlessBackend> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut HistoryBridge<HeadlessBackend> {
        &mut self.bridge
    }

    #[must_use]
    pub fn backend(&self) -> &HeadlessBackend {
        self.bridge.backend()
    }
}

impl Default for ShellSimulator {
    fn default() -> Self {
        Self::new()
    }
}
