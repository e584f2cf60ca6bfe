use crate::error::StageError;
use crate::exchange::{write_tag_record, TagRecord};
use crate::frame::{Frame, Tag};
use crate::stage::{Stage, StageContext};
use std::path::PathBuf;

type TagFilter = Box<dyn FnMut(&Tag) -> bool>;

/// Writes the frame's tags into a tag exchange directory, then forwards the frame
///
/// Place it after a directory writer so the records point at saved frames.
pub struct WriteTagsToDirectory {
    dir: PathBuf,
    filter: TagFilter,
    written: u64,
}

impl WriteTagsToDirectory {
    /// Write every tag.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_filter(dir, |_| true)
    }

    /// Write only tags accepted by `filter`.
    pub fn with_filter(
        dir: impl Into<PathBuf>,
        filter: impl FnMut(&Tag) -> bool + 'static,
    ) -> Self {
        Self {
            dir: dir.into(),
            filter: Box::new(filter),
            written: 0,
        }
    }

    /// Write only tags of `kind`.
    pub fn of_kind(dir: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::with_filter(dir, move |tag| tag.kind() == kind)
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Stage for WriteTagsToDirectory {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        for tag in frame.tags() {
            if (self.filter)(tag) {
                write_tag_record(&self.dir, &TagRecord::new(&frame, tag.clone()))?;
                self.written += 1;
            }
        }
        ctx.output(frame);
        Ok(())
    }
}
