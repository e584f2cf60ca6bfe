//! Tags: typed annotations attached to frames
//!
//! A tag has a `kind` discriminator, a free-text label, an optional region and an
//! open attribute map whose values are a closed sum type ([`TagValue`]).

use crate::error::FormatError;
use crate::frame::document::check_version;
use crate::types::{Point, Region};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// Structured tag schema version
pub const TAG_VERSION: u32 = 1;

/// Kind of tags produced by face detection
pub const FACE: &str = "face";
/// Kind of tags attached to extracted face crops
pub const EXTRACT: &str = "extract";

/// Dynamic attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<TagValue>),
    Map(BTreeMap<String, TagValue>),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

mod base64_bytes {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

impl TagValue {
    /// False when this value, or any value nested in it, is a NaN or infinite float.
    pub fn is_finite(&self) -> bool {
        match self {
            TagValue::Float(v) => v.is_finite(),
            TagValue::List(items) => items.iter().all(TagValue::is_finite),
            TagValue::Map(entries) => entries.values().all(TagValue::is_finite),
            _ => true,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TagValue]> {
        match self {
            TagValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, TagValue>> {
        match self {
            TagValue::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// A list of numbers as `f64`s, e.g. an embedding vector.
    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        self.as_list()?.iter().map(TagValue::as_f64).collect()
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<u32> for TagValue {
    fn from(v: u32) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<usize> for TagValue {
    fn from(v: usize) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

impl From<f32> for TagValue {
    fn from(v: f32) -> Self {
        TagValue::Float(v as f64)
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Str(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Str(v)
    }
}

impl From<Vec<TagValue>> for TagValue {
    fn from(v: Vec<TagValue>) -> Self {
        TagValue::List(v)
    }
}

impl From<Vec<f32>> for TagValue {
    fn from(v: Vec<f32>) -> Self {
        TagValue::List(v.into_iter().map(TagValue::from).collect())
    }
}

impl From<Vec<f64>> for TagValue {
    fn from(v: Vec<f64>) -> Self {
        TagValue::List(v.into_iter().map(TagValue::from).collect())
    }
}

impl From<BTreeMap<String, TagValue>> for TagValue {
    fn from(v: BTreeMap<String, TagValue>) -> Self {
        TagValue::Map(v)
    }
}

impl From<Point> for TagValue {
    fn from(p: Point) -> Self {
        TagValue::List(vec![TagValue::from(p.x), TagValue::from(p.y)])
    }
}

/// Typed annotation on a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    kind: String,
    #[serde(default)]
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
    #[serde(default)]
    attributes: BTreeMap<String, TagValue>,
}

#[derive(Serialize)]
struct TagDocumentRef<'a> {
    version: u32,
    #[serde(flatten)]
    tag: &'a Tag,
}

impl Tag {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: String::new(),
            region: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Region from two opposite corners, normalized to origin + width + height.
    pub fn with_corners(self, a: impl Into<Point>, b: impl Into<Point>) -> Self {
        self.with_region(Region::from_corners(a, b))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Exclusive bottom-right corner of the region, derived from width and height.
    pub fn opposite_corner(&self) -> Option<Point> {
        self.region.as_ref().map(Region::opposite_corner)
    }

    pub fn attributes(&self) -> &BTreeMap<String, TagValue> {
        &self.attributes
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.attributes.get(key)
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Versioned structural form.
    ///
    /// JSON has no NaN or infinity, so an attribute holding one is an error.
    pub fn to_structured(&self) -> Result<serde_json::Value, FormatError> {
        if let Some((key, _)) = self.attributes.iter().find(|(_, value)| !value.is_finite()) {
            return Err(FormatError::NonFiniteNumber(key.clone()));
        }
        Ok(serde_json::to_value(TagDocumentRef {
            version: TAG_VERSION,
            tag: self,
        })?)
    }

    pub fn from_structured(value: serde_json::Value) -> Result<Tag, FormatError> {
        check_version(&value, "tag", TAG_VERSION)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Index<&str> for Tag {
    type Output = TagValue;

    /// Panics when the attribute is absent, like map indexing.
    fn index(&self, key: &str) -> &TagValue {
        match self.attributes.get(key) {
            Some(value) => value,
            None => panic!("tag '{}' has no attribute '{}'", self.kind, key),
        }
    }
}
