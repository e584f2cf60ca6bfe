//! Face stages: tag faces with a detector, then cut them out.

use crate::detect::FaceDetector;
use crate::error::StageError;
use crate::frame::{Frame, Tag, EXTRACT, FACE};
use crate::stage::{Stage, StageContext};
use tracing::{debug, warn};

/// Attribute on `extract` tags numbering the crops taken from one frame
pub const EXTRACT_COUNT: &str = "extract_count";

/// Runs a face detector and adds one `face` tag per detection
pub struct DetectFaces<D: FaceDetector> {
    detector: D,
}

impl<D: FaceDetector> DetectFaces<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

impl<D: FaceDetector> Stage for DetectFaces<D> {
    fn process(&mut self, mut frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let image = frame.image(ctx.cache())?;
        let detections = self.detector.detect(&image)?;
        debug!(frame = %frame.describe(), faces = detections.len(), "Detected faces");

        for detection in &detections {
            frame.add_tag(detection.to_tag());
        }
        ctx.output(frame);
        Ok(())
    }
}

/// Crops every `face` region (grown by `scale` about its centre) into its own frame
///
/// Each crop carries the face tag that produced it plus an `extract` tag whose
/// `extract_count` numbers the crops from 1.
#[derive(Debug, Clone)]
pub struct ExtractFaces {
    scale: f64,
}

impl Default for ExtractFaces {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl ExtractFaces {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Stage for ExtractFaces {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        let cache = ctx.cache();
        let image = frame.image(cache)?;
        let (width, height) = (image.width(), image.height());

        let mut count: u32 = 0;
        for tag in frame.tags_of(FACE) {
            let Some(region) = tag.region() else {
                continue;
            };
            let scaled = region.scale_from_center(self.scale, width, height);
            if scaled.is_empty() {
                warn!(
                    frame = %frame.describe(),
                    region = %region,
                    "Face region is empty after scaling"
                );
                continue;
            }

            count += 1;
            let crop = frame
                .crop(scaled, cache)?
                .with_tag(tag.clone())
                .with_tag(Tag::new(EXTRACT).with_attribute(EXTRACT_COUNT, count));
            ctx.output(crop);
        }
        debug!(frame = %frame.describe(), extracted = count, "Extracted faces");
        Ok(())
    }
}
