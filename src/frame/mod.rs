//! Frames
//!
//! A frame is one image plus its provenance history and tags. Frames backed by a
//! location resolve their pixels lazily through an [`ImageCache`]; crops and other
//! derived frames own their pixels.
//!
//! Pixels and tags sit behind `Arc`s, so cloning a frame is cheap and siblings
//! share buffers until one of them mutates. Mutation always goes through
//! `Arc::make_mut`, which clones the shared buffer first.

pub mod document;
pub mod history;
pub mod tag;
pub mod timestamp;

pub use document::{FrameDocument, FRAME_VERSION};
pub use history::HistoryStep;
pub use tag::{Tag, TagValue, EXTRACT, FACE, TAG_VERSION};

use crate::cache::ImageCache;
use crate::error::{FormatError, FrameError};
use crate::hasher::{content_hash, ContentHash};
use crate::similarity;
use crate::storage::Location;
use crate::types::Region;
use chrono::{DateTime, Utc};
use document::check_version;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// JPEG quality used when a frame has to be encoded
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Dimensions declared up front, for frames that should not materialize pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DimensionOverrides {
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<u32>,
}

/// One image with provenance and tags
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    location: Option<Location>,
    image: Option<Arc<DynamicImage>>,
    history: Vec<HistoryStep>,
    tags: Arc<Vec<Tag>>,
    mime_type: Option<String>,
    created_at: DateTime<Utc>,
    dimensions: DimensionOverrides,
}

impl Frame {
    /// Reference to the image at `location` without reading it.
    ///
    /// Errors surface when pixels are first requested.
    pub fn at(location: impl Into<Location>) -> Self {
        let location = location.into();
        Self {
            mime_type: mime_for(&location),
            created_at: timestamp::created_at(&location),
            history: vec![HistoryStep::Loaded(location.clone())],
            location: Some(location),
            image: None,
            tags: Arc::new(Vec::new()),
            dimensions: DimensionOverrides::default(),
        }
    }

    /// Open the image at `location`, decoding it through `cache` to validate it.
    pub fn open(location: impl Into<Location>, cache: &ImageCache) -> Result<Self, FrameError> {
        let frame = Self::at(location);
        if let Some(location) = &frame.location {
            cache.load_image(location)?;
        }
        Ok(frame)
    }

    /// In-memory frame owning `image`.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            location: None,
            image: Some(Arc::new(image)),
            history: Vec::new(),
            tags: Arc::new(Vec::new()),
            mime_type: None,
            created_at: Utc::now(),
            dimensions: DimensionOverrides::default(),
        }
    }

    /// Frame with declared dimensions and no pixels.
    pub fn placeholder(width: u32, height: u32, depth: u32) -> Self {
        Self {
            location: None,
            image: None,
            history: Vec::new(),
            tags: Arc::new(Vec::new()),
            mime_type: None,
            created_at: Utc::now(),
            dimensions: DimensionOverrides {
                width: Some(width),
                height: Some(height),
                depth: Some(depth),
            },
        }
    }

    /// Rebuild a frame reference from recorded provenance, e.g. a tag exchange
    /// record. Pixels resolve through `location` when one is present.
    pub fn restore(
        location: Option<Location>,
        history: Vec<HistoryStep>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mime_type: location.as_ref().and_then(mime_for),
            location,
            image: None,
            history,
            tags: Arc::new(Vec::new()),
            created_at,
            dimensions: DimensionOverrides::default(),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32, depth: u32) -> Self {
        self.dimensions = DimensionOverrides {
            width: Some(width),
            height: Some(height),
            depth: Some(depth),
        };
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn history(&self) -> &[HistoryStep] {
        &self.history
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the frame owns its pixels rather than resolving them from storage.
    pub fn owns_pixels(&self) -> bool {
        self.image.is_some()
    }

    /// Short human-readable origin for log lines and failure reports.
    pub fn describe(&self) -> String {
        if let Some(location) = &self.location {
            return location.to_string();
        }
        let origin = self.history.iter().rev().find_map(|step| match step {
            HistoryStep::Loaded(location) => Some(location),
            HistoryStep::Cropped(_) => None,
        });
        match origin {
            Some(location) => format!("crop of {}", location),
            None => "<in-memory frame>".to_string(),
        }
    }

    /// Shallow copy sharing pixels and tags with `self`.
    pub fn copy(&self) -> Frame {
        self.clone()
    }

    /// Copy with a private pixel buffer, detached from any location.
    pub fn writable_copy(&self, cache: &ImageCache) -> Result<Frame, FrameError> {
        let pixels = DynamicImage::clone(&*self.image(cache)?);
        let mut copy = self.clone();
        copy.image = Some(Arc::new(pixels));
        copy.location = None;
        Ok(copy)
    }

    /// Decoded pixels, read-only and possibly shared.
    pub fn image(&self, cache: &ImageCache) -> Result<Arc<DynamicImage>, FrameError> {
        match (&self.image, &self.location) {
            (Some(image), _) => Ok(Arc::clone(image)),
            (None, Some(location)) => cache.load_image(location),
            (None, None) => Err(FrameError::NoPixels),
        }
    }

    /// Mutable pixels. Shared buffers are cloned first and the frame is detached
    /// from its location, since the pixels no longer match what is stored there.
    pub fn image_mut(&mut self, cache: &ImageCache) -> Result<&mut DynamicImage, FrameError> {
        if self.image.is_none() {
            self.image = Some(self.image(cache)?);
        }
        self.location = None;
        match self.image.as_mut() {
            Some(image) => Ok(Arc::make_mut(image)),
            None => Err(FrameError::NoPixels),
        }
    }

    pub fn grayscale(&self, cache: &ImageCache) -> Result<Arc<GrayImage>, FrameError> {
        match (&self.image, &self.location) {
            (Some(image), _) => Ok(Arc::new(image.to_luma8())),
            (None, Some(location)) => cache.load_grayscale(location),
            (None, None) => Err(FrameError::NoPixels),
        }
    }

    pub fn width(&self, cache: &ImageCache) -> Result<u32, FrameError> {
        match self.dimensions.width {
            Some(width) => Ok(width),
            None => Ok(self.image(cache)?.width()),
        }
    }

    pub fn height(&self, cache: &ImageCache) -> Result<u32, FrameError> {
        match self.dimensions.height {
            Some(height) => Ok(height),
            None => Ok(self.image(cache)?.height()),
        }
    }

    /// Number of colour channels.
    pub fn depth(&self, cache: &ImageCache) -> Result<u32, FrameError> {
        match self.dimensions.depth {
            Some(depth) => Ok(depth),
            None => Ok(self.image(cache)?.color().channel_count() as u32),
        }
    }

    /// New in-memory frame holding a copy of `region`.
    ///
    /// Tags are not carried over: a crop is a new subject. The crop keeps the
    /// parent's history (plus the crop step) and creation time.
    pub fn crop(&self, region: Region, cache: &ImageCache) -> Result<Frame, FrameError> {
        if region.is_empty() {
            return Err(FrameError::Geometry(format!("empty crop region {}", region)));
        }
        let image = self.image(cache)?;
        if !region.fits_within(image.width(), image.height()) {
            return Err(FrameError::CropOutOfBounds {
                region,
                width: image.width(),
                height: image.height(),
            });
        }

        let pixels = image.crop_imm(region.origin.x, region.origin.y, region.width, region.height);
        let mut history = self.history.clone();
        history.push(HistoryStep::Cropped(region));

        Ok(Frame {
            location: None,
            image: Some(Arc::new(pixels)),
            history,
            tags: Arc::new(Vec::new()),
            mime_type: None,
            created_at: self.created_at,
            dimensions: DimensionOverrides::default(),
        })
    }

    /// Write the frame to `destination` and record it as the frame's location.
    ///
    /// Frames that are still byte-backed are copied verbatim when the destination
    /// format matches; otherwise pixels are encoded as PNG for a `.png`
    /// destination and as JPEG at `jpeg_quality` for anything else.
    pub fn save(
        &mut self,
        destination: &Location,
        cache: &ImageCache,
        jpeg_quality: u8,
    ) -> Result<(), FrameError> {
        let format = output_format(destination);
        let (data, mime_type) = match (&self.image, &self.location) {
            (None, Some(source)) if format_of(source) == Some(format) => {
                (cache.load_bytes(source)?.to_vec(), self.mime_type.clone())
            }
            _ => {
                let image = self.image(cache)?;
                let data = encode(&image, format, jpeg_quality)?;
                (data, Some(format.to_mime_type().to_string()))
            }
        };

        cache.storage().save(destination, &data)?;
        cache.invalidate(destination);
        debug!(destination = %destination, bytes = data.len(), "Saved frame");

        self.history.push(HistoryStep::Loaded(destination.clone()));
        self.location = Some(destination.clone());
        self.mime_type = mime_type;
        Ok(())
    }

    /// Content hash of the stored bytes, or of the JPEG encoding for in-memory frames.
    pub fn hash(&self, cache: &ImageCache) -> Result<ContentHash, FrameError> {
        match (&self.image, &self.location) {
            (_, Some(location)) => cache.content_hash(location),
            (Some(image), None) => Ok(content_hash(&encode(
                image,
                ImageFormat::Jpeg,
                DEFAULT_JPEG_QUALITY,
            )?)),
            (None, None) => Err(FrameError::NoPixels),
        }
    }

    /// Structural similarity of the two frames' grayscale pixels; 0 when `other`
    /// is absent.
    pub fn similarity(&self, other: Option<&Frame>, cache: &ImageCache) -> Result<f64, FrameError> {
        let Some(other) = other else {
            return Ok(0.0);
        };
        similarity::ssim(&*self.grayscale(cache)?, &*other.grayscale(cache)?)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Append a tag. A tag list shared with other frames is cloned first.
    pub fn add_tag(&mut self, tag: Tag) {
        Arc::make_mut(&mut self.tags).push(tag);
    }

    pub fn with_tag(mut self, tag: Tag) -> Frame {
        self.add_tag(tag);
        self
    }

    /// First tag of `kind`, in insertion order.
    pub fn first_tag(&self, kind: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.kind() == kind)
    }

    pub fn tags_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.kind() == kind)
    }

    /// Whether both frames still point at the same tag list.
    pub fn shares_tags_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.tags, &other.tags)
    }

    pub fn to_document(&self) -> Result<FrameDocument, FormatError> {
        Ok(FrameDocument {
            version: FRAME_VERSION,
            location: self.location.clone(),
            history: self.history.clone(),
            tags: self
                .tags
                .iter()
                .map(Tag::to_structured)
                .collect::<Result<_, _>>()?,
            width: self.dimensions.width,
            height: self.dimensions.height,
            depth: self.dimensions.depth,
            mime_type: self.mime_type.clone(),
            created_at: self.created_at,
        })
    }

    /// Versioned structural form. Pixels are not included.
    pub fn to_structured(&self) -> Result<serde_json::Value, FormatError> {
        Ok(serde_json::to_value(self.to_document()?)?)
    }

    pub fn from_structured(value: serde_json::Value) -> Result<Frame, FormatError> {
        check_version(&value, "frame", FRAME_VERSION)?;
        let doc: FrameDocument = serde_json::from_value(value)?;
        let tags = doc
            .tags
            .into_iter()
            .map(Tag::from_structured)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame {
            location: doc.location,
            image: None,
            history: doc.history,
            tags: Arc::new(tags),
            mime_type: doc.mime_type,
            created_at: doc.created_at,
            dimensions: DimensionOverrides {
                width: doc.width,
                height: doc.height,
                depth: doc.depth,
            },
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Frame {} tags={}>", self.describe(), self.tags.len())
    }
}

fn format_of(location: &Location) -> Option<ImageFormat> {
    location.extension().and_then(ImageFormat::from_extension)
}

fn mime_for(location: &Location) -> Option<String> {
    format_of(location).map(|format| format.to_mime_type().to_string())
}

fn output_format(destination: &Location) -> ImageFormat {
    match format_of(destination) {
        Some(ImageFormat::Png) => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

/// Encode pixels as `format`; JPEG drops any alpha channel.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, FrameError> {
    let mut data = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut data, jpeg_quality);
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        other => image.write_to(&mut Cursor::new(&mut data), other),
    };
    result.map_err(|e| FrameError::Encode(e.to_string()))?;
    Ok(data)
}
