//! Bamboo: Frame/Stage Pipelines for Face Analysis
//!
//! Frames (an image plus provenance and tags) flow through a graph of stages such
//! as face detectors, croppers, filters and writers. A single-threaded pipeline
//! drains the work queue, keeps per-stage timing statistics and skips frames that
//! fail with recoverable errors.

pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod exchange;
pub mod frame;
pub mod hasher;
pub mod logging;
pub mod pipeline;
pub mod similarity;
pub mod source;
pub mod stage;
pub mod storage;
pub mod types;

pub use cache::ImageCache;
pub use config::{BambooConfig, ConfigLoader};
pub use detect::{Detection, FaceDetector};
pub use error::{ConfigError, FormatError, FrameError, PipelineError, StageError, StorageError};
pub use frame::tag::{Tag, TagValue};
pub use frame::{Frame, HistoryStep};
pub use pipeline::{Pipeline, StageId};
pub use stage::{Stage, StageContext};
pub use storage::{Location, Storage};
pub use types::{Point, Region};
