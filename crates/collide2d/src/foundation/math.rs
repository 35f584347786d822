//! Math utilities and types
//!
//! Provides the fundamental math types for 2D collision detection.

pub use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Axis-Aligned rectangle for spatial queries and narrow-phase tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner of the rectangle
    pub min: Vec2,
    /// Maximum corner of the rectangle
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from its min corner and a width/height pair
    pub fn from_position_size(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            min: position,
            max: position + Vec2::new(width, height),
        }
    }

    /// Create a rectangle centered at a point with given half-extents
    pub fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// The degenerate rectangle at the origin
    pub fn zero() -> Self {
        Self {
            min: Vec2::zeros(),
            max: Vec2::zeros(),
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Get the center of the rectangle
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the rectangle
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// True if the rectangle encloses a positive area
    pub fn has_area(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    /// Check if this rectangle contains a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if this rectangle intersects another (touching edges count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Compute the overlap rectangle with another rectangle
    ///
    /// Returns `Some` only when the overlap has positive width and height;
    /// touching edges do not count as an overlap here.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min = Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Vec2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        let result = Rect::new(min, max);
        result.has_area().then_some(result)
    }

    /// Grow this rectangle so that it also encloses `other`
    ///
    /// Each edge only ever moves outward; the existing extent is never
    /// reduced.
    pub fn encapsulate(&mut self, other: &Rect) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }

    /// Return a copy of this rectangle shifted by `offset`
    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect::new(self.min + offset, self.max + offset)
    }
}
