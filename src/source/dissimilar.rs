//! Burst filter: drops frames that look too much like the previously emitted one.

use super::DEFAULT_SIMILARITY_THRESHOLD;
use crate::cache::ImageCache;
use crate::config::SourceConfig;
use crate::error::FrameError;
use crate::frame::Frame;
use crate::similarity;
use image::GrayImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wraps a frame source and emits a frame only when its SSIM against the last
/// emitted frame is at most `threshold`. The first readable frame is always emitted.
///
/// Every candidate is decoded before it can become the reference, so an
/// unreadable frame surfaces as its own error and never poisons later comparisons.
/// Frames too small to compare are logged and skipped. Other errors pass through
/// to the consumer unchanged.
pub struct DissimilarFrameStream<I> {
    inner: I,
    cache: Arc<ImageCache>,
    threshold: f64,
    reference: Option<Arc<GrayImage>>,
}

impl<I> DissimilarFrameStream<I>
where
    I: Iterator<Item = Result<Frame, FrameError>>,
{
    pub fn new(inner: I, cache: Arc<ImageCache>) -> Self {
        Self::with_threshold(inner, cache, DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(inner: I, cache: Arc<ImageCache>, threshold: f64) -> Self {
        Self {
            inner,
            cache,
            threshold,
            reference: None,
        }
    }

    /// Threshold taken from `source.similarity_threshold`.
    pub fn from_config(inner: I, cache: Arc<ImageCache>, config: &SourceConfig) -> Self {
        Self::with_threshold(inner, cache, config.similarity_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<I> Iterator for DissimilarFrameStream<I>
where
    I: Iterator<Item = Result<Frame, FrameError>>,
{
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = match self.inner.next()? {
                Ok(frame) => frame,
                Err(err) => return Some(Err(err)),
            };

            let pixels = match frame.grayscale(&self.cache) {
                Ok(pixels) => pixels,
                Err(err) => return Some(Err(err)),
            };

            let score = match &self.reference {
                None => 0.0,
                Some(reference) => match similarity::ssim(&pixels, reference) {
                    Ok(score) => score,
                    Err(err @ FrameError::Geometry(_)) => {
                        warn!(
                            frame = %frame.describe(),
                            error = %err,
                            "Cannot compare frame, skipping"
                        );
                        continue;
                    }
                    Err(err) => return Some(Err(err)),
                },
            };

            if score <= self.threshold {
                self.reference = Some(pixels);
                return Some(Ok(frame));
            }
            debug!(frame = %frame.describe(), score, "Dropping similar frame");
        }
    }
}
