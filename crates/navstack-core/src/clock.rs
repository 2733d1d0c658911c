#![forbid(unsafe_code)]

//! Clock implementations.

use core::time::Duration;

use web_time::{Instant, SystemTime, UNIX_EPOCH};

use crate::backend::BackendClock;

/// Deterministic clock controlled by the host or a test.
///
/// Monotonic time starts at zero; wall time is `wall_origin_ms` plus the
/// monotonic offset.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
    wall_origin_ms: u64,
}

impl DeterministicClock {
    /// Create a clock at `0` with a wall origin of the Unix epoch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            wall_origin_ms: 0,
        }
    }

    /// Create a clock whose wall time starts at `origin_ms`.
    #[must_use]
    pub const fn with_wall_origin(origin_ms: u64) -> Self {
        Self {
            now: Duration::ZERO,
            wall_origin_ms: origin_ms,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl BackendClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }

    fn wall_millis(&self) -> u64 {
        let offset = u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX);
        self.wall_origin_ms.saturating_add(offset)
    }
}

/// Real clock backed by `web-time` (`performance.now()` / `Date.now()` on
/// wasm, `std::time` elsewhere).
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendClock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.start.elapsed()
    }

    fn wall_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}
