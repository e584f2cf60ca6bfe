//! Directory writer
//!
//! Saves every frame under a root location and forwards the saved frame (now
//! carrying its new location) downstream. Names come either from a counter
//! template or from the frame's content hash, sharded into two directory levels:
//! `{root}/{hex[0..2]}/{hex[2..4]}/{hex}.{ext}`. Directories are created lazily by
//! the storage backend, which remembers the ones it already made.

use crate::config::WriterConfig;
use crate::error::StageError;
use crate::frame::{Frame, DEFAULT_JPEG_QUALITY};
use crate::stage::{Stage, StageContext};
use crate::storage::Location;
use tracing::debug;

/// How output files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNaming {
    /// Template with a `{counter}` or zero-padded `{counter:0N}` placeholder
    Counter { template: String },
    /// Content-addressed, sharded by the first two hash bytes
    Sharded { extension: String },
}

impl Default for FileNaming {
    fn default() -> Self {
        FileNaming::Counter {
            template: "{counter:08}.jpg".to_string(),
        }
    }
}

pub struct WriteFramesToDirectory {
    root: Location,
    naming: FileNaming,
    counter: u64,
    jpeg_quality: u8,
}

impl WriteFramesToDirectory {
    pub fn new(root: impl Into<Location>) -> Self {
        Self {
            root: root.into(),
            naming: FileNaming::default(),
            counter: 0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Writer using `writer.jpeg_quality` for JPEG output.
    pub fn from_config(root: impl Into<Location>, config: &WriterConfig) -> Self {
        Self::new(root).with_jpeg_quality(config.jpeg_quality)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.naming = FileNaming::Counter {
            template: template.into(),
        };
        self
    }

    pub fn sharded(mut self, extension: impl Into<String>) -> Self {
        self.naming = FileNaming::Sharded {
            extension: extension.into(),
        };
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.counter
    }

    fn destination(&self, frame: &Frame, ctx: &StageContext<'_>) -> Result<Location, StageError> {
        match &self.naming {
            FileNaming::Counter { template } => {
                Ok(self.root.join(&render_counter(template, self.counter)))
            }
            FileNaming::Sharded { extension } => {
                let hex = frame.hash(ctx.cache())?.to_hex();
                Ok(self.root.join(&format!(
                    "{}/{}/{}.{}",
                    &hex[0..2],
                    &hex[2..4],
                    hex,
                    extension
                )))
            }
        }
    }
}

impl Stage for WriteFramesToDirectory {
    fn process(&mut self, mut frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let destination = self.destination(&frame, ctx)?;
        frame.save(&destination, ctx.cache(), self.jpeg_quality)?;
        self.counter += 1;
        debug!(destination = %destination, count = self.counter, "Wrote frame");
        ctx.output(frame);
        Ok(())
    }
}

/// Substitute `{counter}` / `{counter:0N}` placeholders.
pub fn render_counter(template: &str, counter: u64) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while let Some(start) = rest.find("{counter") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let format = &rest[start + "{counter".len()..start + len];
        let width = format
            .strip_prefix(':')
            .and_then(|w| w.trim_start_matches('0').parse::<usize>().ok());
        match width {
            Some(width) => out.push_str(&format!("{:0width$}", counter, width = width)),
            None => out.push_str(&counter.to_string()),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}
