//! Error types for the bamboo pipeline framework.
//!
//! Errors are split by concern. Per-frame data problems ([`FrameError`]) are
//! recoverable: drivers and the pipeline's drain loop log them and move on to the
//! next frame. Everything else describes a misconfigured pipeline and halts the run.

use crate::storage::Location;
use crate::types::Region;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Location not found: {0}")]
    NotFound(Location),

    #[error("Unsupported scheme '{scheme}' in location {location}")]
    UnsupportedScheme { scheme: String, location: Location },

    #[error("Storage backend for {0} is read-only")]
    ReadOnly(Location),

    #[error("HTTP request for {location} failed: {message}")]
    Http { location: Location, message: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while materializing, comparing or transforming a single frame
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Image not found at {location}: {reason}")]
    NotFound { location: Location, reason: String },

    #[error("Not an image: {location}: {reason}")]
    NotAnImage { location: Location, reason: String },

    #[error("Unreadable tag record {location}: {reason}")]
    BadRecord { location: Location, reason: String },

    #[error("Crop {region} is outside of the {width}x{height} frame")]
    CropOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Frame has neither pixels nor a location")]
    NoPixels,

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FrameError {
    /// Whether a driver may skip the offending frame and continue with the next one.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::NotFound { .. }
                | FrameError::NotAnImage { .. }
                | FrameError::BadRecord { .. }
                | FrameError::CropOutOfBounds { .. }
                | FrameError::Geometry(_)
        )
    }

    /// The location the error refers to, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            FrameError::NotFound { location, .. }
            | FrameError::NotAnImage { location, .. }
            | FrameError::BadRecord { location, .. } => Some(location),
            FrameError::Storage(StorageError::NotFound(location)) => Some(location),
            _ => None,
        }
    }
}

/// Structured (JSON) form errors for frames, tags and tag exchange records
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported {document} version {found} (expected {expected})")]
    UnsupportedVersion {
        document: &'static str,
        found: u64,
        expected: u32,
    },

    #[error("Missing version field in {0} document")]
    MissingVersion(&'static str),

    #[error("Invalid document: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Attribute '{0}' holds a non-finite number")]
    NonFiniteNumber(String),

    #[error("Format I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors a stage's `process` or `shutdown` may return
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Stage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Only per-frame data errors are recoverable; everything else is fail-fast.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StageError::Frame(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

/// Pipeline-level errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline is not running; call start() or run() first")]
    NotRunning,

    #[error("Pipeline is already running")]
    AlreadyRunning,

    #[error("Pipeline has no entry stage")]
    NoEntryStage,

    #[error("A linear pipeline needs at least one stage")]
    EmptyPipeline,

    #[error("Unknown stage id: {0}")]
    UnknownStage(usize),

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    #[error("Shutdown of stage '{stage}' failed: {source}")]
    Shutdown {
        stage: String,
        #[source]
        source: StageError,
    },

    #[error("Frame source failed: {0}")]
    Source(#[from] FrameError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading, validation and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
