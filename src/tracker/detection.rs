//! Labeled detections and the label predicate used to pick cars out of them.

use std::fmt;
use std::sync::Arc;

use nalgebra::Point2;

use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Bounding box in TLWH format
    pub bbox: Rect,
    /// Free-text label, e.g. a class name with an optional confidence
    pub label: String,
}

impl Detection {
    pub fn new(x: i32, y: i32, width: i32, height: i32, label: impl Into<String>) -> Self {
        Self {
            bbox: Rect::new(x, y, width, height),
            label: label.into(),
        }
    }

    pub fn from_rect(bbox: Rect, label: impl Into<String>) -> Self {
        Self {
            bbox,
            label: label.into(),
        }
    }

    #[inline]
    pub fn center(&self) -> Point2<f64> {
        self.bbox.center()
    }

    #[inline]
    pub fn distance_to(&self, other: &Detection) -> f64 {
        self.bbox.distance_to(&other.bbox)
    }
}

/// Predicate deciding which detection labels count as cars.
///
/// Cheap to clone; the predicate itself is shared.
#[derive(Clone)]
pub struct LabelFilter {
    description: String,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl LabelFilter {
    /// Case-insensitive substring match, e.g. `"car"` accepts
    /// `"class: Car - 91.20%"`.
    pub fn substring(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let lowered = needle.to_lowercase();
        Self {
            description: format!("contains {needle:?}"),
            predicate: Arc::new(move |label: &str| label.to_lowercase().contains(&lowered)),
        }
    }

    /// Wrap an arbitrary predicate.
    pub fn from_fn<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Accept every label.
    pub fn any() -> Self {
        Self::from_fn("any", |_| true)
    }

    #[inline]
    pub fn matches(&self, label: &str) -> bool {
        (self.predicate)(label)
    }

    /// Keep only the detections whose label matches, preserving order.
    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| self.matches(&d.label))
            .collect()
    }
}

impl Default for LabelFilter {
    fn default() -> Self {
        Self::substring("car")
    }
}

impl fmt::Debug for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LabelFilter").field(&self.description).finish()
    }
}
