//! Directory-based tag exchange
//!
//! One JSON file per tag, named `<uuid-v4>.tag.json`, holding a reference to the
//! tagged frame and the tag itself:
//!
//! ```json
//! {"version": 1,
//!  "frame": {"location": "...", "history": [...], "created_at": "..."},
//!  "tag": {"version": 1, "kind": "face", ...}}
//! ```
//!
//! A detection run writes these; a later analysis pass (clustering, galleries)
//! reads them back without re-running detection.

use crate::error::FormatError;
use crate::frame::document::check_version;
use crate::frame::{Frame, HistoryStep, Tag};
use crate::storage::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

/// Tag record schema version
pub const RECORD_VERSION: u32 = 1;

/// File name suffix of tag records
pub const TAG_FILE_SUFFIX: &str = ".tag.json";

/// Provenance of the frame a tag was attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReference {
    pub location: Option<Location>,
    #[serde(default)]
    pub history: Vec<HistoryStep>,
    pub created_at: DateTime<Utc>,
}

impl From<&Frame> for FrameReference {
    fn from(frame: &Frame) -> Self {
        Self {
            location: frame.location().cloned(),
            history: frame.history().to_vec(),
            created_at: frame.created_at(),
        }
    }
}

/// One (frame reference, tag) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TagRecord {
    pub frame: FrameReference,
    pub tag: Tag,
}

impl TagRecord {
    pub fn new(frame: &Frame, tag: Tag) -> Self {
        Self {
            frame: FrameReference::from(frame),
            tag,
        }
    }

    pub fn to_structured(&self) -> Result<Value, FormatError> {
        Ok(json!({
            "version": RECORD_VERSION,
            "frame": serde_json::to_value(&self.frame)?,
            "tag": self.tag.to_structured()?,
        }))
    }

    pub fn from_structured(mut value: Value) -> Result<Self, FormatError> {
        check_version(&value, "tag record", RECORD_VERSION)?;
        let frame = serde_json::from_value(value["frame"].take())?;
        let tag = Tag::from_structured(value["tag"].take())?;
        Ok(Self { frame, tag })
    }

    /// Frame reference carrying just this record's tag.
    pub fn to_frame(&self) -> Frame {
        Frame::restore(
            self.frame.location.clone(),
            self.frame.history.clone(),
            self.frame.created_at,
        )
        .with_tag(self.tag.clone())
    }
}

/// Write `record` into `dir` under a fresh random name, atomically.
pub fn write_tag_record(dir: &Path, record: &TagRecord) -> Result<PathBuf, FormatError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}{}", Uuid::new_v4(), TAG_FILE_SUFFIX));
    let temp_path = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(&record.to_structured()?)?;

    fs::write(&temp_path, &data)?;
    if let Err(e) = fs::rename(&temp_path, &path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    debug!(path = %path.display(), kind = record.tag.kind(), "Wrote tag record");
    Ok(path)
}

pub fn read_tag_record(path: &Path) -> Result<TagRecord, FormatError> {
    let data = fs::read(path)?;
    TagRecord::from_structured(serde_json::from_slice(&data)?)
}

/// Tag records in a directory, in file-name order
///
/// Each item is one file's result, so a caller may skip unreadable records.
pub struct TagsFromDirectory {
    paths: std::vec::IntoIter<PathBuf>,
}

impl TagsFromDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, FormatError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir.as_ref())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| FormatError::IoError(e.into()))?;
            let is_record = entry
                .file_name()
                .to_str()
                .map(|name| name.ends_with(TAG_FILE_SUFFIX))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_record {
                paths.push(entry.into_path());
            }
        }
        Ok(Self {
            paths: paths.into_iter(),
        })
    }

    /// The remaining record files, unread.
    pub fn into_paths(self) -> std::vec::IntoIter<PathBuf> {
        self.paths
    }
}

impl Iterator for TagsFromDirectory {
    type Item = Result<TagRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.paths.next().map(|path| read_tag_record(&path))
    }
}

/// Read every record in `dir`, failing on the first bad one.
pub fn read_tag_directory(dir: impl AsRef<Path>) -> Result<Vec<TagRecord>, FormatError> {
    TagsFromDirectory::new(dir)?.collect()
}
