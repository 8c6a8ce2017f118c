//! Trait for drawing annotations onto frames.

use crate::error::BoxError;
use crate::integration::frame::Frame;
use crate::tracker::{Detection, Rect};

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const GREEN: Color = Color([0, 255, 0]);
    pub const RED: Color = Color([255, 0, 0]);
    /// Default detection box color
    pub const CYAN: Color = Color([0, 255, 205]);
}

/// In-place drawing operations on a frame.
pub trait Annotator {
    /// Error type for drawing failures.
    type Error: Into<BoxError>;

    fn draw_rectangle(
        &self,
        frame: &mut Frame,
        rect: &Rect,
        color: Color,
    ) -> Result<(), Self::Error>;

    /// Thin outline for regions such as the action zone. Defaults to
    /// `draw_rectangle`.
    fn draw_outline(
        &self,
        frame: &mut Frame,
        rect: &Rect,
        color: Color,
    ) -> Result<(), Self::Error> {
        self.draw_rectangle(frame, rect, color)
    }

    /// Draw `text` with its top-left corner at `position`.
    fn draw_text(
        &self,
        frame: &mut Frame,
        text: &str,
        position: (i32, i32),
        color: Color,
    ) -> Result<(), Self::Error>;

    fn draw_line(
        &self,
        frame: &mut Frame,
        start: (i32, i32),
        end: (i32, i32),
        color: Color,
    ) -> Result<(), Self::Error>;

    /// Draw every detection box, optionally with its label at the top-left corner.
    fn draw_rectangles(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
        color: Color,
        draw_labels: bool,
    ) -> Result<(), Self::Error> {
        for detection in detections {
            self.draw_rectangle(frame, &detection.bbox, color)?;
            if draw_labels {
                self.draw_text(frame, &detection.label, detection.bbox.top_left(), color)?;
            }
        }
        Ok(())
    }
}
