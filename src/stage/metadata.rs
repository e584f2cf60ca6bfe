//! Structured-metadata writer
//!
//! Writes each frame's structured form (everything except pixels) as pretty JSON.
//! With a root, documents go to `{root}/{n}.json`; otherwise next to the frame's own
//! location with a `.json` extension. Frames with neither are skipped with a warning.

use crate::error::{FormatError, StageError};
use crate::frame::Frame;
use crate::stage::{Stage, StageContext};
use crate::storage::Location;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct WriteFrameMetadata {
    root: Option<Location>,
    counter: u64,
}

impl WriteFrameMetadata {
    /// Write each document next to its frame.
    pub fn sibling() -> Self {
        Self::default()
    }

    /// Write numbered documents under `root`.
    pub fn in_directory(root: impl Into<Location>) -> Self {
        Self {
            root: Some(root.into()),
            counter: 0,
        }
    }
}

impl Stage for WriteFrameMetadata {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let destination = match (&self.root, frame.location()) {
            (Some(root), _) => Some(root.join(&format!("{}.json", self.counter))),
            (None, Some(location)) => Some(location.with_extension("json")),
            (None, None) => None,
        };

        match destination {
            Some(destination) => {
                let document =
                    serde_json::to_vec_pretty(&frame.to_structured()?).map_err(FormatError::from)?;
                ctx.cache().storage().save(&destination, &document)?;
                self.counter += 1;
                debug!(destination = %destination, "Wrote frame metadata");
            }
            None => warn!(
                frame = %frame.describe(),
                "Frame has no location and no metadata root; metadata not written"
            ),
        }

        ctx.output(frame);
        Ok(())
    }
}
