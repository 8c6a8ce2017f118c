//! Builder for creating Detection objects from various input formats.

use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
///
/// Model outputs usually come as floating point boxes; coordinates are
/// rounded to whole pixels.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class_name: String,
    score: Option<f32>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Set the class name, e.g. `"car"`.
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Set the confidence score in `[0, 1]`.
    pub fn score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Build the final `Detection`.
    ///
    /// With a score the label reads `"class: car - 91.20%"`, otherwise it is
    /// the bare class name.
    pub fn build(self) -> Detection {
        let x = self.x1.round() as i32;
        let y = self.y1.round() as i32;
        let width = (self.x2 - self.x1).round() as i32;
        let height = (self.y2 - self.y1).round() as i32;
        let label = match self.score {
            Some(score) => format!("class: {} - {:.2}%", self.class_name, score * 100.0),
            None => self.class_name,
        };
        Detection::from_rect(Rect::new(x, y, width, height), label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .tlbr(10.4, 20.0, 50.0, 80.6)
            .class_name("car")
            .score(0.9512)
            .build();

        assert_eq!(det.bbox, Rect::new(10, 20, 40, 61));
        assert_eq!(det.label, "class: car - 95.12%");
    }

    #[test]
    fn test_xywh_and_bare_label() {
        let det = DetectionBuilder::new()
            .xywh(50.0, 50.0, 20.0, 10.0)
            .class_name("truck")
            .build();
        assert_eq!(det.bbox, Rect::new(40, 45, 20, 10));
        assert_eq!(det.label, "truck");
    }

    #[test]
    fn test_tlwh() {
        let det = DetectionBuilder::new().tlwh(1.0, 2.0, 3.0, 4.0).build();
        assert_eq!(det.bbox, Rect::new(1, 2, 3, 4));
    }
}
