//! Directory walker yielding one frame reference per image file

use super::SourceOptions;
use crate::error::FrameError;
use crate::frame::Frame;
use crate::storage::Location;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Frames under a root directory
///
/// Within each directory, files come first in name order, then subdirectories in
/// name order. A root that is a single file yields just that file, whatever its
/// type. Zero-byte and corrupt files are still yielded; decoding them fails later
/// with a recoverable error.
pub struct FrameStream {
    root: PathBuf,
    entries: walkdir::IntoIter,
    options: SourceOptions,
    emitted: usize,
}

impl FrameStream {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_options(root, SourceOptions::default())
    }

    pub fn with_options(root: impl AsRef<Path>, options: SourceOptions) -> Self {
        let root = root.as_ref().to_path_buf();
        debug!(root = %root.display(), limit = ?options.limit, "Walking frame source");
        let entries = WalkDir::new(&root)
            .follow_links(options.follow_symlinks)
            .sort_by(files_then_directories)
            .into_iter();
        Self {
            root,
            entries,
            options,
            emitted: 0,
        }
    }

    fn accepts(&self, entry: &DirEntry, frame: &Frame) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        frame
            .mime_type()
            .map(|mime| mime.starts_with(&self.options.mime_prefix))
            .unwrap_or(false)
    }
}

fn files_then_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

impl Iterator for FrameStream {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.options.limit.is_some_and(|limit| self.emitted >= limit) {
            return None;
        }

        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(&self.root);
                    return Some(Err(FrameError::NotFound {
                        location: Location::from_path(path),
                        reason: err.to_string(),
                    }));
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let frame = Frame::at(entry.path());
            if !self.accepts(&entry, &frame) {
                trace!(path = %entry.path().display(), "Skipping non-image file");
                continue;
            }

            self.emitted += 1;
            return Some(Ok(frame));
        }
    }
}
