//! Integration module for connecting detectors and annotators with the tracker.
//!
//! This module provides the collaborator traits, the `Processor` that runs
//! detection in parallel and tracking in order, and reference
//! implementations for both collaborators.

mod annotator;
mod builder;
mod cancel;
mod canvas;
mod detector;
mod frame;
mod frame_difference;
mod pipeline;
mod reorder;

pub use annotator::{Annotator, Color};
pub use builder::DetectionBuilder;
pub use cancel::CancellationToken;
pub use canvas::CanvasAnnotator;
pub use detector::{Detector, FrameContext, FrameInput};
pub use frame::{DEFAULT_FPS, Frame, Video};
pub use frame_difference::{FrameDifferenceDetector, FrameDifferenceError};
pub use pipeline::{AnnotatedVideo, Processor};
pub use reorder::ReorderBuffer;
