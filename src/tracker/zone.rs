//! Action zone: the region of interest detections must fall inside.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracker::detection::Detection;
use crate::tracker::rect::Rect;

/// Top margin left out of the default zone.
pub const DEFAULT_TOP_MARGIN: i32 = 125;

/// Resolved region of interest for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionZone {
    rect: Rect,
}

impl ActionZone {
    /// Build a zone from an explicit rectangle. Negative sizes are rejected.
    pub fn new(rect: Rect) -> Result<Self> {
        if rect.width < 0 || rect.height < 0 {
            return Err(Error::InvalidConfig(format!(
                "action zone has negative size {}x{}",
                rect.width, rect.height
            )));
        }
        Ok(Self { rect })
    }

    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    /// Whether the detection lies fully inside the zone, edges included.
    #[inline]
    pub fn admits(&self, detection: &Detection) -> bool {
        self.rect.contains(&detection.bbox)
    }

    /// Keep the detections fully inside the zone, preserving input order.
    pub fn filter(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections.into_iter().filter(|d| self.admits(d)).collect()
    }
}

/// How the action zone is derived from the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneSpec {
    /// Fixed rectangle.
    Explicit {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// From `(x, y)` to the bottom-right corner of the frame.
    Anchored { x: i32, y: i32 },
    /// Whole frame minus a band at the top.
    FullFrame { top_margin: i32 },
}

impl Default for ZoneSpec {
    fn default() -> Self {
        Self::FullFrame {
            top_margin: DEFAULT_TOP_MARGIN,
        }
    }
}

impl ZoneSpec {
    /// Check the parts that do not depend on the frame size.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Explicit { width, height, .. } if width < 0 || height < 0 => {
                Err(Error::InvalidConfig(format!(
                    "action zone has negative size {width}x{height}"
                )))
            }
            Self::Anchored { x, y } if x < 0 || y < 0 => Err(Error::InvalidConfig(format!(
                "action zone anchor ({x}, {y}) is negative"
            ))),
            Self::FullFrame { top_margin } if top_margin < 0 => Err(Error::InvalidConfig(
                format!("action zone top margin {top_margin} is negative"),
            )),
            _ => Ok(()),
        }
    }

    /// Resolve against the dimensions of the video.
    ///
    /// Sizes derived from the frame are clamped at zero when the anchor or
    /// margin lies beyond the frame.
    pub fn resolve(&self, frame_width: u32, frame_height: u32) -> Result<ActionZone> {
        self.validate()?;
        let frame_width = i32::try_from(frame_width).unwrap_or(i32::MAX);
        let frame_height = i32::try_from(frame_height).unwrap_or(i32::MAX);
        let rect = match *self {
            Self::Explicit {
                x,
                y,
                width,
                height,
            } => Rect::new(x, y, width, height),
            Self::Anchored { x, y } => {
                Rect::new(x, y, (frame_width - x).max(0), (frame_height - y).max(0))
            }
            Self::FullFrame { top_margin } => Rect::new(
                0,
                top_margin,
                frame_width,
                (frame_height - top_margin).max(0),
            ),
        };
        ActionZone::new(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ActionZone {
        ActionZone::new(Rect::new(0, 0, 100, 100)).unwrap()
    }

    #[test]
    fn test_filter_keeps_fully_contained() {
        let detections = vec![
            Detection::new(10, 10, 20, 20, "car"),
            Detection::new(90, 90, 20, 20, "car"),
            Detection::new(-5, 10, 20, 20, "car"),
            Detection::new(50, 50, 10, 10, "car"),
        ];
        let kept = zone().filter(detections);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].bbox, Rect::new(10, 10, 20, 20));
        assert_eq!(kept[1].bbox, Rect::new(50, 50, 10, 10));
    }

    #[test]
    fn test_corner_on_edge_is_inside() {
        let on_edge = Detection::new(80, 80, 20, 20, "car");
        assert!(zone().admits(&on_edge));
        let origin = Detection::new(0, 0, 0, 0, "car");
        assert!(zone().admits(&origin));
    }

    #[test]
    fn test_negative_size_rejected() {
        assert!(ActionZone::new(Rect::new(0, 0, -1, 10)).is_err());
        let spec = ZoneSpec::Explicit {
            x: 0,
            y: 0,
            width: 10,
            height: -3,
        };
        assert!(matches!(spec.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_default_zone_skips_top_margin() {
        let zone = ZoneSpec::default().resolve(640, 480).unwrap();
        assert_eq!(*zone.rect(), Rect::new(0, 125, 640, 355));
    }

    #[test]
    fn test_full_frame_margin_larger_than_frame() {
        let zone = ZoneSpec::FullFrame { top_margin: 200 }.resolve(100, 100).unwrap();
        assert_eq!(*zone.rect(), Rect::new(0, 200, 100, 0));
    }

    #[test]
    fn test_anchored_zone_extends_to_frame_corner() {
        let zone = ZoneSpec::Anchored { x: 40, y: 30 }.resolve(640, 480).unwrap();
        assert_eq!(*zone.rect(), Rect::new(40, 30, 600, 450));
    }

    #[test]
    fn test_zone_spec_from_json() {
        let spec: ZoneSpec =
            serde_json::from_str(r#"{"kind":"explicit","x":1,"y":2,"width":3,"height":4}"#)
                .unwrap();
        assert_eq!(
            spec,
            ZoneSpec::Explicit {
                x: 1,
                y: 2,
                width: 3,
                height: 4
            }
        );
    }
}
