#![forbid(unsafe_code)]

//! Identifier newtypes for overlays and routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one open overlay.
///
/// Ids only need to be unique within the currently-open set; the same id may
/// be reused once its previous overlay has been closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(String);

impl OverlayId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the id for the `seq`-th generated overlay.
    #[must_use]
    pub fn generated(prefix: &str, seq: u64) -> Self {
        Self(format!("{prefix}_{seq}"))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OverlayId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OverlayId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Name of a top-level page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    /// Create a route from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the route name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty route name, which hosts treat as "no route".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Route {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Route {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_sequence() {
        let id = OverlayId::generated("overlay", 7);
        assert_eq!(id.as_str(), "overlay_7");
        assert_eq!(id.to_string(), "overlay_7");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OverlayId::new("m1")).unwrap();
        assert_eq!(json, "\"m1\"");
        let route: Route = serde_json::from_str("\"finance\"").unwrap();
        assert_eq!(route, Route::new("finance"));
    }

    #[test]
    fn empty_route_is_detected() {
        assert!(Route::new("").is_empty());
        assert!(!Route::from("dashboard").is_empty());
    }
}
