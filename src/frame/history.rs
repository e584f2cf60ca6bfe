//! Provenance history of a frame's pixels.

use crate::storage::Location;
use crate::types::Region;
use serde::de::Error as _;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One step in how a frame's pixels were derived
///
/// Serialized as a `[kind, payload]` pair: `["loaded", "<location>"]` or
/// `["cropped", {"origin": {"x": .., "y": ..}, "width": .., "height": ..}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    Loaded(Location),
    Cropped(Region),
}

const LOADED: &str = "loaded";
const CROPPED: &str = "cropped";

impl HistoryStep {
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryStep::Loaded(_) => LOADED,
            HistoryStep::Cropped(_) => CROPPED,
        }
    }
}

impl fmt::Display for HistoryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStep::Loaded(location) => write!(f, "loaded {}", location),
            HistoryStep::Cropped(region) => write!(f, "cropped {}", region),
        }
    }
}

impl Serialize for HistoryStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(self.kind())?;
        match self {
            HistoryStep::Loaded(location) => pair.serialize_element(location)?,
            HistoryStep::Cropped(region) => pair.serialize_element(region)?,
        }
        pair.end()
    }
}

impl<'de> Deserialize<'de> for HistoryStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (kind, payload) = <(String, serde_json::Value)>::deserialize(deserializer)?;
        match kind.as_str() {
            LOADED => serde_json::from_value(payload)
                .map(HistoryStep::Loaded)
                .map_err(D::Error::custom),
            CROPPED => serde_json::from_value(payload)
                .map(HistoryStep::Cropped)
                .map_err(D::Error::custom),
            other => Err(D::Error::unknown_variant(other, &[LOADED, CROPPED])),
        }
    }
}
