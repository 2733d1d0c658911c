#![forbid(unsafe_code)]

//! Tagged history records.
//!
//! The only thing the host lets us store per navigation entry is an opaque
//! state value. We write one of two tagged shapes into it:
//!
//! ```text
//! { "kind": "overlay", "overlayId": "m1",        "timestamp": 1700000000000 }
//! { "kind": "route",   "routeName": "dashboard", "timestamp": 1700000000000 }
//! ```
//!
//! The entry that existed before the app pushed anything carries no state at
//! all and decodes to `None`.
//!
//! # Decoding
//!
//! Decoding is lenient. Anything that is not recognisably one of our records
//! decodes to `None`, which the bridge treats like the initial entry. The
//! untagged legacy shapes `{ "modal": id }` and `{ "route": name }` are still
//! accepted so that entries written by older builds keep unwinding correctly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordDecodeError;
use crate::id::{OverlayId, Route};

/// Discriminant of a [`HistoryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Overlay,
    Route,
}

impl RecordKind {
    /// Stable lowercase label, matching the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Route => "route",
        }
    }
}

/// One entry we wrote into host history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HistoryRecord {
    /// Pushed when an overlay opened.
    Overlay {
        #[serde(rename = "overlayId")]
        overlay_id: OverlayId,
        timestamp: u64,
    },
    /// Pushed when the page changed.
    Route {
        #[serde(rename = "routeName")]
        route_name: Route,
        timestamp: u64,
    },
}

impl HistoryRecord {
    /// Record for an overlay open.
    #[must_use]
    pub fn overlay(overlay_id: OverlayId, timestamp: u64) -> Self {
        Self::Overlay {
            overlay_id,
            timestamp,
        }
    }

    /// Record for a route change.
    #[must_use]
    pub fn route(route_name: Route, timestamp: u64) -> Self {
        Self::Route {
            route_name,
            timestamp,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Overlay { .. } => RecordKind::Overlay,
            Self::Route { .. } => RecordKind::Route,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        match self {
            Self::Overlay { timestamp, .. } | Self::Route { timestamp, .. } => *timestamp,
        }
    }

    /// Overlay id for overlay records.
    #[must_use]
    pub fn overlay_id(&self) -> Option<&OverlayId> {
        match self {
            Self::Overlay { overlay_id, .. } => Some(overlay_id),
            Self::Route { .. } => None,
        }
    }

    /// Route name for route records.
    #[must_use]
    pub fn route_name(&self) -> Option<&Route> {
        match self {
            Self::Route { route_name, .. } => Some(route_name),
            Self::Overlay { .. } => None,
        }
    }

    /// Encode to the JSON wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Only strings and integers; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Encode to a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Decode a host state value; `None` for absent or foreign state.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let timestamp = obj.get("timestamp").and_then(timestamp_of).unwrap_or(0);

        match obj.get("kind").and_then(Value::as_str) {
            Some("overlay") => {
                let id = non_empty_str(obj.get("overlayId"))?;
                Some(Self::overlay(OverlayId::new(id), timestamp))
            }
            Some("route") => {
                // An empty route name still marks a route entry; the bridge
                // resolves it to the default route.
                let name = obj
                    .get("routeName")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(Self::route(Route::new(name), timestamp))
            }
            Some(_) => None,
            None => {
                if let Some(id) = non_empty_str(obj.get("modal")) {
                    return Some(Self::overlay(OverlayId::new(id), timestamp));
                }
                non_empty_str(obj.get("route"))
                    .map(|name| Self::route(Route::new(name), timestamp))
            }
        }
    }

    /// Decode host state serialized as JSON text.
    ///
    /// Returns `Ok(None)` for `null` and for well-formed JSON that is not one
    /// of our records; `Err` only when the text is not JSON at all.
    pub fn from_json(text: &str) -> Result<Option<Self>, RecordDecodeError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| RecordDecodeError::InvalidJson(err.to_string()))?;
        Ok(Self::from_value(&value))
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn timestamp_of(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| t as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overlay_record_wire_shape() {
        let record = HistoryRecord::overlay(OverlayId::new("m1"), 42);
        assert_eq!(
            record.to_value(),
            serde_json::json!({"kind": "overlay", "overlayId": "m1", "timestamp": 42})
        );
    }

    #[test]
    fn encodes_route_wire_shape() {
        let record = HistoryRecord::route(Route::new("finance"), 7);
        assert_eq!(
            record.to_value(),
            serde_json::json!({"kind": "route", "routeName": "finance", "timestamp": 7})
        );
    }

    #[test]
    fn decodes_tagged_records() {
        let overlay = HistoryRecord::from_json(
            r#"{"kind":"overlay","overlayId":"m2","timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(
            overlay,
            Some(HistoryRecord::overlay(OverlayId::new("m2"), 1_700_000_000_000))
        );

        let route =
            HistoryRecord::from_json(r#"{"kind":"route","routeName":"dashboard","timestamp":3}"#)
                .unwrap();
        assert_eq!(route, Some(HistoryRecord::route(Route::new("dashboard"), 3)));
    }

    #[test]
    fn null_and_foreign_state_decode_to_none() {
        assert_eq!(HistoryRecord::from_json("null").unwrap(), None);
        assert_eq!(HistoryRecord::from_json(r#"{"test":true}"#).unwrap(), None);
        assert_eq!(HistoryRecord::from_json(r#"{"kind":"scroll"}"#).unwrap(), None);
        assert_eq!(HistoryRecord::from_json("17").unwrap(), None);
    }

    #[test]
    fn overlay_record_without_id_is_foreign() {
        assert_eq!(
            HistoryRecord::from_json(r#"{"kind":"overlay","overlayId":""}"#).unwrap(),
            None
        );
    }

    #[test]
    fn route_record_with_empty_name_is_kept() {
        let record = HistoryRecord::from_json(r#"{"kind":"route","routeName":""}"#)
            .unwrap()
            .unwrap();
        assert_eq!(record.kind(), RecordKind::Route);
        assert!(record.route_name().unwrap().is_empty());
    }

    #[test]
    fn legacy_shapes_are_accepted() {
        let overlay = HistoryRecord::from_json(r#"{"modal":"modal_1","timestamp":5}"#).unwrap();
        assert_eq!(
            overlay,
            Some(HistoryRecord::overlay(OverlayId::new("modal_1"), 5))
        );
        let route = HistoryRecord::from_json(r#"{"route":"services"}"#).unwrap();
        assert_eq!(route, Some(HistoryRecord::route(Route::new("services"), 0)));
    }

    #[test]
    fn fractional_timestamps_truncate() {
        let record =
            HistoryRecord::from_json(r#"{"kind":"route","routeName":"a","timestamp":12.9}"#)
                .unwrap()
                .unwrap();
        assert_eq!(record.timestamp(), 12);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            HistoryRecord::from_json("not json"),
            Err(RecordDecodeError::InvalidJson(_))
        ));
    }
}
