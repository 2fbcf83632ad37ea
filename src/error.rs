use std::path::PathBuf;
use thiserror::Error;

use crate::playback::Mode;

/// Failures raised by a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{} is not a supported image file", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("camera {index} is unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    /// Transient: the capture produced no frame this time.
    #[error("no frame available: {0}")]
    EndOfStream(String),
}

/// Failures of a single playback session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImageLoaded,

    #[error("operation requires {expected:?} mode, current mode is {current:?}")]
    WrongMode { expected: Mode, current: Mode },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("detection failed: {0:#}")]
    Detection(anyhow::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("confidence threshold must be in (0, 1], got {0}")]
    Confidence(f32),

    #[error("IoU threshold must be in [0, 1], got {0}")]
    Iou(f32),

    #[error("tick interval must be non-zero")]
    TickInterval,
}
