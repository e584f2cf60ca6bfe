//! Frame sources
//!
//! Sources yield `Result<Frame, FrameError>` so a driver such as
//! [`Pipeline::process_stream`](crate::pipeline::Pipeline::process_stream) can skip
//! one bad item and keep going. Frames are references: pixels are read when a
//! stage first asks for them.

pub mod dissimilar;
pub mod walker;

pub use dissimilar::DissimilarFrameStream;
pub use walker::FrameStream;

use crate::config::SourceConfig;
use crate::error::{FormatError, FrameError};
use crate::exchange::{read_tag_record, TagsFromDirectory};
use crate::frame::Frame;
use crate::storage::Location;
use std::path::Path;
use tracing::debug;

/// Frames scoring above this against the last emitted frame are dropped.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Directory walking options
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOptions {
    /// Stop after this many frames
    pub limit: Option<usize>,
    /// Only files whose guessed MIME type starts with this prefix
    pub mime_prefix: String,
    pub follow_symlinks: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            limit: None,
            mime_prefix: "image/".to_string(),
            follow_symlinks: false,
        }
    }
}

impl From<&SourceConfig> for SourceOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            limit: config.limit,
            follow_symlinks: config.follow_symlinks,
            ..Self::default()
        }
    }
}

/// One frame reference per location, in the given order.
pub fn frames_from_locations<I>(locations: I) -> impl Iterator<Item = Result<Frame, FrameError>>
where
    I: IntoIterator,
    I::Item: Into<Location>,
{
    locations.into_iter().map(|location| Ok(Frame::at(location)))
}

/// Frames rebuilt from a tag exchange directory, each carrying its record's tag.
///
/// An unreadable record yields a recoverable [`FrameError::BadRecord`] naming its
/// file, so drivers report it and move on to the next record.
pub fn frames_from_tag_directory(
    dir: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Frame, FrameError>>, FormatError> {
    let paths = TagsFromDirectory::new(dir)?.into_paths();
    Ok(paths.map(|path| match read_tag_record(&path) {
        Ok(record) => Ok(record.to_frame()),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Unreadable tag record");
            Err(FrameError::BadRecord {
                location: Location::from_path(&path),
                reason: err.to_string(),
            })
        }
    }))
}
