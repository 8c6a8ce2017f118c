//! Classical motion detector based on the difference between consecutive frames.

use image::{GrayImage, Luma};
use imageproc::contours::{self, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::median_filter;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use thiserror::Error;

use super::{Detector, FrameContext, FrameInput};
use crate::tracker::{Detection, Rect};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDifferenceError {
    #[error("frame {index} is {got:?} but the previous frame is {expected:?}")]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        got: (u32, u32),
    },
}

/// Finds moving blobs by differencing a frame against its predecessor.
///
/// Grayscale difference, binary threshold, dilation with a 5x5 square,
/// 9x9 median blur, then one box per external contour whose area reaches
/// `min_area`. The first frame of a video yields nothing.
#[derive(Debug, Clone)]
pub struct FrameDifferenceDetector {
    min_area: f64,
    threshold: u8,
    dilate_iterations: usize,
    label: String,
}

impl Default for FrameDifferenceDetector {
    fn default() -> Self {
        Self {
            min_area: 800.0,
            threshold: 40,
            dilate_iterations: 4,
            label: "car".to_string(),
        }
    }
}

impl FrameDifferenceDetector {
    pub fn new(min_area: f64) -> Self {
        Self {
            min_area,
            ..Self::default()
        }
    }

    /// Pixel difference above which a pixel counts as moving.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_dilate_iterations(mut self, iterations: usize) -> Self {
        self.dilate_iterations = iterations;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn motion_mask(&self, previous: &GrayImage, current: &GrayImage) -> GrayImage {
        let mut mask = GrayImage::new(current.width(), current.height());
        for (out, (a, b)) in mask
            .pixels_mut()
            .zip(previous.pixels().zip(current.pixels()))
        {
            let diff = a.0[0].abs_diff(b.0[0]);
            *out = Luma([if diff > self.threshold { 255 } else { 0 }]);
        }

        for _ in 0..self.dilate_iterations {
            mask = dilate(&mask, Norm::LInf, 2);
        }
        median_filter(&mask, 4, 4)
    }
}

impl Detector for FrameDifferenceDetector {
    type Error = FrameDifferenceError;

    fn context(&self) -> FrameContext {
        FrameContext::Paired
    }

    fn detect_frame(&self, input: FrameInput<'_>) -> Result<Vec<Detection>, Self::Error> {
        let Some(previous) = input.previous else {
            return Ok(Vec::new());
        };
        let expected = (previous.width(), previous.height());
        let got = (input.current.width(), input.current.height());
        if expected != got {
            return Err(FrameDifferenceError::DimensionMismatch {
                index: input.index,
                expected,
                got,
            });
        }

        let previous = image::imageops::grayscale(previous.image());
        let current = image::imageops::grayscale(input.current.image());
        let mask = self.motion_mask(&previous, &current);

        let detections = contours::find_contours::<i32>(&mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter(|c| polygon_area(&c.points) >= self.min_area)
            .filter_map(|c| bounding_rect(&c.points))
            .map(|bbox| Detection::from_rect(bbox, self.label.clone()))
            .collect();
        Ok(detections)
    }
}

/// Shoelace area of a closed contour.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.abs() as f64 / 2.0
}

/// Smallest box covering all points, inclusive of the extreme pixels.
fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
    for p in points {
        x1 = x1.min(p.x);
        y1 = y1.min(p.y);
        x2 = x2.max(p.x);
        y2 = y2.max(p.y);
    }
    Some(Rect::from_tlbr(x1, y1, x2 + 1, y2 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::Frame;
    use image::Rgb;

    fn with_square(size: u32, x: u32, y: u32, side: u32) -> Frame {
        let mut frame = Frame::blank(size, size);
        for py in y..y + side {
            for px in x..x + side {
                frame.image_mut().put_pixel(px, py, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    #[test]
    fn test_first_frame_has_no_detections() {
        let frames = vec![Frame::blank(32, 32)];
        let detector = FrameDifferenceDetector::default();
        let input = FrameInput::at(&frames, 0, detector.context());
        assert!(detector.detect_frame(input).unwrap().is_empty());
    }

    #[test]
    fn test_moving_square_is_detected() {
        let frames = vec![Frame::blank(120, 120), with_square(120, 30, 30, 40)];
        let detector = FrameDifferenceDetector::default();
        let detections = detector
            .detect_frame(FrameInput::at(&frames, 1, FrameContext::Paired))
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "car");
        assert!(detections[0].bbox.contains(&Rect::new(30, 30, 39, 39)));
    }

    #[test]
    fn test_small_change_is_ignored() {
        let frames = vec![Frame::blank(120, 120), with_square(120, 50, 50, 5)];
        let detector = FrameDifferenceDetector::default();
        let detections = detector
            .detect_frame(FrameInput::at(&frames, 1, FrameContext::Paired))
            .unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_identical_frames() {
        let frames = vec![with_square(64, 10, 10, 20), with_square(64, 10, 10, 20)];
        let detector = FrameDifferenceDetector::default();
        let detections = detector
            .detect_frame(FrameInput::at(&frames, 1, FrameContext::Paired))
            .unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let frames = vec![Frame::blank(10, 10), Frame::blank(12, 10)];
        let detector = FrameDifferenceDetector::default();
        let err = detector
            .detect_frame(FrameInput::at(&frames, 1, FrameContext::Paired))
            .unwrap_err();
        assert_eq!(
            err,
            FrameDifferenceError::DimensionMismatch {
                index: 1,
                expected: (10, 10),
                got: (12, 10)
            }
        );
    }

    #[test]
    fn test_polygon_area_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(
            bounding_rect(&square),
            Some(Rect::new(0, 0, 11, 11))
        );
    }
}
