//! Face detector seam
//!
//! Detection engines (cascade classifiers, neural detectors, cloud APIs) plug in
//! behind [`FaceDetector`]. The pipeline only consumes the regions, confidences and
//! optional landmarks/embeddings they report.

use crate::frame::{Tag, TagValue, FACE};
use crate::types::{Point, Region};
use image::DynamicImage;

/// Attribute keys written onto `face` tags
pub const CONFIDENCE: &str = "confidence";
pub const KEYPOINTS: &str = "keypoints";
pub const EMBEDDING: &str = "embedding";

/// One detected face
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub region: Region,
    pub confidence: f64,
    pub keypoints: Vec<Point>,
    pub embedding: Option<Vec<f32>>,
}

impl Detection {
    pub fn new(region: Region, confidence: f64) -> Self {
        Self {
            region,
            confidence,
            keypoints: Vec::new(),
            embedding: None,
        }
    }

    pub fn with_keypoints(mut self, keypoints: Vec<Point>) -> Self {
        self.keypoints = keypoints;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// `face` tag carrying the region, confidence and any landmarks or embedding.
    pub fn to_tag(&self) -> Tag {
        let mut tag = Tag::new(FACE)
            .with_region(self.region)
            .with_attribute(CONFIDENCE, self.confidence);
        if !self.keypoints.is_empty() {
            let points: Vec<TagValue> =
                self.keypoints.iter().copied().map(TagValue::from).collect();
            tag.set(KEYPOINTS, points);
        }
        if let Some(embedding) = &self.embedding {
            tag.set(EMBEDDING, embedding.clone());
        }
        tag
    }
}

/// Face detection backend
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&DynamicImage) -> anyhow::Result<Vec<Detection>> + Send,
{
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        self(image)
    }
}
