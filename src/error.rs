//! Error types for configuration and pipeline runs.

use thiserror::Error;

/// Boxed error returned by detector and annotator collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Detection failed on frame {frame}: {source}")]
    Detection {
        frame: usize,
        #[source]
        source: BoxError,
    },

    #[error("Whole-video detection failed: {0}")]
    VideoDetection(#[source] BoxError),

    #[error("Annotation failed on frame {frame}: {source}")]
    Annotation {
        frame: usize,
        #[source]
        source: BoxError,
    },

    #[error("Detector returned results for {got} frames, expected {expected}")]
    DetectionCountMismatch { expected: usize, got: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn detection(frame: usize, source: impl Into<BoxError>) -> Self {
        Self::Detection {
            frame,
            source: source.into(),
        }
    }

    pub(crate) fn annotation(frame: usize, source: impl Into<BoxError>) -> Self {
        Self::Annotation {
            frame,
            source: source.into(),
        }
    }
}
