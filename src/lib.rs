//! Counts cars crossing an action zone in a video.
//!
//! Detections from any [`Detector`] are filtered to the action zone and to
//! car labels, correlated across frames into [`Trace`]s by the
//! [`CarTracker`], and drawn back onto the frames by an [`Annotator`].

pub mod config;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::ProcessorConfig;
pub use error::{BoxError, Error, Result};
pub use integration::{
    AnnotatedVideo, Annotator, CancellationToken, CanvasAnnotator, Color, DetectionBuilder,
    Detector, Frame, FrameContext, FrameDifferenceDetector, FrameInput, Processor, Video,
};
pub use tracker::{
    ActionZone, CarTracker, Detection, LabelFilter, MatchPolicy, Rect, Trace, TraceId,
    TraceReport, TraceState, TrackerConfig, ZoneSpec,
};
