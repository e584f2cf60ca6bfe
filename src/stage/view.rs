//! Headless frame viewers
//!
//! There is no display surface here: viewing a frame logs a summary line and then
//! blocks for the configured wait, which keeps the pacing of an interactive run.

use crate::error::StageError;
use crate::frame::Frame;
use crate::stage::{Stage, StageContext};
use std::time::Duration;
use tracing::info;

/// Shows every frame, then forwards it
#[derive(Debug, Default)]
pub struct ShowFrames {
    wait: Option<Duration>,
    shown: u64,
}

impl ShowFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait(wait: Duration) -> Self {
        Self {
            wait: Some(wait),
            shown: 0,
        }
    }

    /// Frames shown so far.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl Stage for ShowFrames {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let image = frame.image(ctx.cache())?;
        info!(
            frame = %frame.describe(),
            width = image.width(),
            height = image.height(),
            tags = frame.tags().len(),
            "Show frame"
        );
        self.shown += 1;
        pause(self.wait);
        ctx.output(frame);
        Ok(())
    }
}

/// Shows the tags of every tagged frame, then forwards all frames
#[derive(Debug, Default)]
pub struct ShowTags {
    wait: Option<Duration>,
    shown: u64,
}

impl ShowTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait(wait: Duration) -> Self {
        Self {
            wait: Some(wait),
            shown: 0,
        }
    }

    /// Frames shown so far.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl Stage for ShowTags {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if !frame.tags().is_empty() {
            for tag in frame.tags() {
                match tag.region() {
                    Some(region) => info!(
                        frame = %frame.describe(),
                        kind = tag.kind(),
                        label = tag.label(),
                        region = %region,
                        "Show tag"
                    ),
                    None => info!(
                        frame = %frame.describe(),
                        kind = tag.kind(),
                        label = tag.label(),
                        "Show tag"
                    ),
                }
            }
            self.shown += 1;
            pause(self.wait);
        }
        ctx.output(frame);
        Ok(())
    }
}

fn pause(wait: Option<Duration>) {
    if let Some(wait) = wait.filter(|w| !w.is_zero()) {
        std::thread::sleep(wait);
    }
}
