//! Structured (JSON) form of a frame
//!
//! Everything except pixels: location, history, versioned tags, dimension
//! overrides, MIME type and creation time. Readers reject any top-level version
//! other than [`FRAME_VERSION`].

use crate::error::FormatError;
use crate::frame::history::HistoryStep;
use crate::storage::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured frame schema version
pub const FRAME_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDocument {
    pub version: u32,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub history: Vec<HistoryStep>,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fail unless `value` carries `"version": expected`.
pub(crate) fn check_version(
    value: &Value,
    document: &'static str,
    expected: u32,
) -> Result<(), FormatError> {
    let found = value
        .get("version")
        .ok_or(FormatError::MissingVersion(document))?;
    match found.as_u64() {
        Some(v) if v == expected as u64 => Ok(()),
        Some(v) => Err(FormatError::UnsupportedVersion {
            document,
            found: v,
            expected,
        }),
        None => Err(FormatError::MissingVersion(document)),
    }
}
