//! Axis-aligned rectangles
//!
//! Screen-style coordinates: `top` is the smaller y value and `bottom` the
//! larger one.

use serde::{Serialize, Deserialize};

use crate::Vec2;

/// An axis-aligned rectangle stored by its four edges
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a rectangle from its edges
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Smallest rectangle covering every point, or `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min_components(p), max.max_components(p)));
        Some(Self::new(min.x, min.y, max.x, max.y))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    /// The four corners, clockwise from the top-left
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.left, self.top),
            Vec2::new(self.right, self.top),
            Vec2::new(self.right, self.bottom),
            Vec2::new(self.left, self.bottom),
        ]
    }

    /// Strict overlap test
    ///
    /// Rectangles that only share an edge or a corner do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Check if a point is inside or on the rectangle
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Translate the rectangle by a delta
    #[inline]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.left + delta.x, self.top + delta.y, self.right + delta.x, self.bottom + delta.y)
    }
}
