//! Configuration
//!
//! Settings are layered by the `config` crate: built-in defaults, then the user's
//! global `config.toml`, then the workspace `config/config.toml` and
//! `config/{BAMBOO_ENV}.toml`, then `BAMBOO__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BambooConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub writer: WriterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Image cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries kept per cache kind (bytes, decoded, grayscale, hashes)
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_capacity() -> usize {
    crate::cache::lru::DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

/// Pipeline scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Log one summary line per stage when the pipeline stops
    #[serde(default = "default_true")]
    pub stats_on_stop: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_on_stop: default_true(),
        }
    }
}

/// Frame source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Frames scoring above this SSIM against the last emitted frame are dropped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_similarity_threshold() -> f64 {
    crate::source::DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            limit: None,
            follow_symlinks: false,
        }
    }
}

/// Frame writer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    crate::frame::DEFAULT_JPEG_QUALITY
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// A single configuration violation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Cache(String),
    Source(String),
    Writer(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "cache: {}", msg),
            ValidationError::Source(msg) => write!(f, "source: {}", msg),
            ValidationError::Writer(msg) => write!(f, "writer: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BambooConfig {
    /// Check every section, collecting all violations rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.cache.capacity == 0 {
            errors.push(ValidationError::Cache(
                "capacity must be at least 1".to_string(),
            ));
        }

        let threshold = self.source.similarity_threshold;
        if !(threshold.is_finite() && (-1.0..=1.0).contains(&threshold)) {
            errors.push(ValidationError::Source(format!(
                "similarity_threshold {} is outside [-1, 1]",
                threshold
            )));
        }
        if self.source.limit == Some(0) {
            errors.push(ValidationError::Source(
                "limit must be positive when set".to_string(),
            ));
        }

        if !(1..=100).contains(&self.writer.jpeg_quality) {
            errors.push(ValidationError::Writer(format!(
                "jpeg_quality {} is outside 1..=100",
                self.writer.jpeg_quality
            )));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "unknown format '{}'",
                self.logging.format
            )));
        }
        if crate::logging::LogOutput::parse(&self.logging.output).is_err() {
            errors.push(ValidationError::Logging(format!(
                "unknown output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
