//! Trait for object detection backends.

use crate::error::BoxError;
use crate::integration::frame::{Frame, Video};
use crate::tracker::Detection;

/// Which frames a detector needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameContext {
    /// Each frame is detected on its own.
    #[default]
    Independent,
    /// Detection compares a frame with the one before it, e.g. frame
    /// differencing. The previous frame is passed in explicitly, so the
    /// detector keeps no memory between calls.
    Paired,
}

/// The frames handed to one detection call.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Position of `current` in the video
    pub index: usize,
    pub current: &'a Frame,
    /// The preceding frame; only set for `FrameContext::Paired` detectors
    /// and never for the first frame.
    pub previous: Option<&'a Frame>,
}

impl<'a> FrameInput<'a> {
    /// Build the input for `frames[index]`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn at(frames: &'a [Frame], index: usize, context: FrameContext) -> Self {
        let previous = match context {
            FrameContext::Independent => None,
            FrameContext::Paired => index.checked_sub(1).map(|i| &frames[i]),
        };
        Self {
            index,
            current: &frames[index],
            previous,
        }
    }
}

/// Trait for object detection backends.
///
/// Implement this trait to connect any detection model to the pipeline.
/// Calls take `&self` and may run concurrently from several worker threads
/// on different frames, so implementations must not rely on call order.
///
/// # Example
///
/// ```ignore
/// use car_tracker::{Detection, Detector, FrameInput};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl Detector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect_frame(&self, input: FrameInput<'_>) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Error type for detection failures.
    type Error: Into<BoxError>;

    /// Whether the detector needs the previous frame.
    fn context(&self) -> FrameContext {
        FrameContext::Independent
    }

    /// Detect objects in a single frame.
    fn detect_frame(&self, input: FrameInput<'_>) -> Result<Vec<Detection>, Self::Error>;

    /// Detect objects in every frame of a video, one entry per frame in
    /// input order.
    fn detect_video(&self, video: &Video) -> Result<Vec<Vec<Detection>>, Self::Error> {
        let context = self.context();
        (0..video.len())
            .map(|index| self.detect_frame(FrameInput::at(video.frames(), index, context)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct PreviousWidth;

    impl Detector for PreviousWidth {
        type Error = Infallible;

        fn context(&self) -> FrameContext {
            FrameContext::Paired
        }

        fn detect_frame(&self, input: FrameInput<'_>) -> Result<Vec<Detection>, Self::Error> {
            Ok(input
                .previous
                .map(|prev| Detection::new(0, 0, prev.width() as i32, 1, "car"))
                .into_iter()
                .collect())
        }
    }

    #[test]
    fn test_frame_input_context() {
        let frames = vec![Frame::blank(4, 4), Frame::blank(6, 4)];
        assert!(FrameInput::at(&frames, 0, FrameContext::Paired).previous.is_none());
        assert!(FrameInput::at(&frames, 1, FrameContext::Independent).previous.is_none());
        let paired = FrameInput::at(&frames, 1, FrameContext::Paired);
        assert_eq!(paired.previous.map(Frame::width), Some(4));
        assert_eq!(paired.current.width(), 6);
    }

    #[test]
    fn test_detect_video_walks_frames_in_order() {
        let video = Video::new(
            vec![Frame::blank(3, 1), Frame::blank(5, 1), Frame::blank(7, 1)],
            30.0,
        );
        let per_frame = PreviousWidth.detect_video(&video).unwrap();
        assert_eq!(per_frame.len(), 3);
        assert!(per_frame[0].is_empty());
        assert_eq!(per_frame[1][0].bbox.width, 3);
        assert_eq!(per_frame[2][0].bbox.width, 5);
    }
}
