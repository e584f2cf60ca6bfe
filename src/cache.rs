//! Image cache
//!
//! Memoizes, per location, the raw bytes, the decoded image, its grayscale
//! derivative and the content hash. Each kind has its own bounded LRU behind its
//! own lock; a miss is computed while holding that lock so concurrent requests for
//! the same location decode once.
//!
//! Decoded images are published as `Arc<DynamicImage>` and never mutated afterwards.
//! Frames that need to write pixels clone first (see [`crate::frame::Frame::image_mut`]).

pub mod lru;

pub use lru::{LruMap, DEFAULT_CAPACITY};

use crate::error::{FrameError, StorageError};
use crate::hasher::{content_hash, ContentHash};
use crate::storage::{Location, SchemeRouter, Storage};
use image::{DynamicImage, GrayImage};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Hit/miss counters and occupancy of one cache kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub bytes: KindStats,
    pub images: KindStats,
    pub grayscale: KindStats,
    pub hashes: KindStats,
}

pub struct ImageCache {
    storage: Arc<dyn Storage>,
    bytes: Mutex<LruMap<Location, Arc<Vec<u8>>>>,
    images: Mutex<LruMap<Location, Arc<DynamicImage>>>,
    grayscale: Mutex<LruMap<Location, Arc<GrayImage>>>,
    hashes: Mutex<LruMap<Location, ContentHash>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ImageCache {
    /// Cache over the default scheme router.
    pub fn new(capacity: usize) -> Self {
        Self::with_storage(Arc::new(SchemeRouter::new()), capacity)
    }

    pub fn with_storage(storage: Arc<dyn Storage>, capacity: usize) -> Self {
        Self {
            storage,
            bytes: Mutex::new(LruMap::new(capacity)),
            images: Mutex::new(LruMap::new(capacity)),
            grayscale: Mutex::new(LruMap::new(capacity)),
            hashes: Mutex::new(LruMap::new(capacity)),
        }
    }

    /// The storage backend loads and saves go through.
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn load_bytes(&self, location: &Location) -> Result<Arc<Vec<u8>>, FrameError> {
        self.bytes.lock().get_or_try_insert_with(location, || {
            debug!(location = %location, "Loading bytes");
            match self.storage.load(location) {
                Ok(data) => Ok(Arc::new(data)),
                Err(e @ StorageError::UnsupportedScheme { .. }) => Err(FrameError::Storage(e)),
                Err(e) => Err(FrameError::NotFound {
                    location: location.clone(),
                    reason: e.to_string(),
                }),
            }
        })
    }

    /// Decoded image for `location`.
    ///
    /// Zero-byte and undecodable content both yield [`FrameError::NotAnImage`].
    pub fn load_image(&self, location: &Location) -> Result<Arc<DynamicImage>, FrameError> {
        self.images.lock().get_or_try_insert_with(location, || {
            let data = self.load_bytes(location)?;
            if data.is_empty() {
                return Err(FrameError::NotAnImage {
                    location: location.clone(),
                    reason: "zero-byte file".to_string(),
                });
            }
            let image =
                image::load_from_memory(&data).map_err(|e| FrameError::NotAnImage {
                    location: location.clone(),
                    reason: e.to_string(),
                })?;
            debug!(
                location = %location,
                width = image.width(),
                height = image.height(),
                "Decoded image"
            );
            Ok(Arc::new(image))
        })
    }

    pub fn load_grayscale(&self, location: &Location) -> Result<Arc<GrayImage>, FrameError> {
        self.grayscale.lock().get_or_try_insert_with(location, || {
            let image = self.load_image(location)?;
            Ok(Arc::new(image.to_luma8()))
        })
    }

    /// Content hash of the stored bytes.
    pub fn content_hash(&self, location: &Location) -> Result<ContentHash, FrameError> {
        self.hashes.lock().get_or_try_insert_with(location, || {
            let data = self.load_bytes(location)?;
            Ok(content_hash(&data))
        })
    }

    /// Forget everything cached for one location, e.g. after it was overwritten.
    pub fn invalidate(&self, location: &Location) {
        fn drop_key<V: Clone>(map: &Mutex<LruMap<Location, V>>, location: &Location) {
            map.lock().remove(location);
        }
        drop_key(&self.bytes, location);
        drop_key(&self.images, location);
        drop_key(&self.grayscale, location);
        drop_key(&self.hashes, location);
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
        self.images.lock().clear();
        self.grayscale.lock().clear();
        self.hashes.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        fn kind<V: Clone>(map: &Mutex<LruMap<Location, V>>) -> KindStats {
            let map = map.lock();
            KindStats {
                hits: map.hits(),
                misses: map.misses(),
                entries: map.len(),
            }
        }
        CacheStats {
            bytes: kind(&self.bytes),
            images: kind(&self.images),
            grayscale: kind(&self.grayscale),
            hashes: kind(&self.hashes),
        }
    }
}
