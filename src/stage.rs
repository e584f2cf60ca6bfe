//! Stages
//!
//! A stage is one node in the pipeline graph. It receives frames one at a time and
//! emits zero or more frames through [`StageContext::output`]; the pipeline fans
//! every emitted frame out to the stage's successors. Timing statistics and
//! input/output filters are kept by the pipeline, so implementors only write
//! `process` (and `shutdown` if they accumulate state across a run).

pub mod face;
pub mod filter;
pub mod gallery;
pub mod metadata;
pub mod passthrough;
pub mod stats;
pub mod tags;
pub mod view;
pub mod write;

pub use face::{DetectFaces, ExtractFaces};
pub use filter::FilterFrames;
pub use gallery::HtmlGallery;
pub use metadata::WriteFrameMetadata;
pub use passthrough::Multiplex;
pub use stats::StageStats;
pub use tags::WriteTagsToDirectory;
pub use view::{ShowFrames, ShowTags};
pub use write::{FileNaming, WriteFramesToDirectory};

use crate::cache::ImageCache;
use crate::error::StageError;
use crate::frame::Frame;

/// Predicate over frames, used for input and output filters
pub type FramePredicate = Box<dyn FnMut(&Frame) -> bool>;

/// Per-invocation handle a stage uses to reach shared resources and emit frames
pub struct StageContext<'a> {
    cache: &'a ImageCache,
    outputs: Vec<Frame>,
}

impl<'a> StageContext<'a> {
    pub fn new(cache: &'a ImageCache) -> Self {
        Self {
            cache,
            outputs: Vec::new(),
        }
    }

    pub fn cache(&self) -> &'a ImageCache {
        self.cache
    }

    /// Emit a frame to every successor of the running stage.
    pub fn output(&mut self, frame: Frame) {
        self.outputs.push(frame);
    }

    /// Frames emitted so far, in emission order.
    pub fn take_outputs(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.outputs)
    }
}

/// A unit of per-frame processing
pub trait Stage {
    /// Name used in statistics and log lines; defaults to the bare type name.
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Handle one frame. The default forwards it unchanged.
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        ctx.output(frame);
        Ok(())
    }

    /// Called once when the owning pipeline stops.
    fn shutdown(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}

/// `bamboo::stage::face::DetectFaces<my::Detector>` → `DetectFaces`
fn short_type_name(full: &str) -> String {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}
