use nalgebra::Point2;

/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as TLWH: top-left corner plus width and height. Width and height
/// are expected to be non-negative; a negative size is a caller error and is
/// not checked here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: i32,
    /// Top-left y coordinate
    pub y: i32,
    /// Width of the bounding box
    pub width: i32,
    /// Height of the bounding box
    pub height: i32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub const fn from_tlbr(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    #[inline]
    pub fn bottom_right(&self) -> (i32, i32) {
        (self.right(), self.bottom())
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn distance_to(&self, other: &Rect) -> f64 {
        nalgebra::distance(&self.center(), &other.center())
    }

    /// Whether a point lies inside the box. Edges count as inside.
    #[inline]
    pub fn contains_point(&self, (px, py): (i32, i32)) -> bool {
        self.x <= px && px <= self.right() && self.y <= py && py <= self.bottom()
    }

    /// Whether `other` lies entirely inside this box.
    ///
    /// Both the top-left and the bottom-right corner of `other` must be
    /// inside, so a box touching the border is still contained.
    #[inline]
    pub fn contains(&self, other: &Rect) -> bool {
        self.contains_point(other.top_left()) && self.contains_point(other.bottom_right())
    }
}
