#![forbid(unsafe_code)]

//! Persisted route.
//!
//! One string key holds the last route. Reads happen once at startup; writes
//! happen on every navigate and every unwind to a route. Storage failures
//! never escape: reads fall back to the default route, writes are dropped.

use navstack_core::{KeyValueStore, Route};

/// Reads and writes the persisted route under one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStore {
    key: String,
}

impl RouteStore {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persisted route, or `default` when absent, empty, or unreadable.
    pub fn load<K: KeyValueStore>(&self, store: &K, default: &Route) -> Route {
        match store.get(&self.key) {
            Ok(Some(value)) if !value.is_empty() => Route::new(value),
            Ok(_) => default.clone(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "route read failed; using default");
                default.clone()
            }
        }
    }

    /// Persist `route`. Returns whether the write succeeded.
    pub fn save<K: KeyValueStore>(&self, store: &mut K, route: &Route) -> bool {
        match store.set(&self.key, route.as_str()) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %self.key, route = %route, error = %err, "route write failed");
                false
            }
        }
    }
}
