//! Inclusive pixel rectangles used for clipping and dirty regions.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with inclusive bounds.
///
/// A rectangle whose min exceeds its max on either axis is empty; that is the
/// natural result of intersecting two disjoint rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Rect {
    /// Rectangle spanning (min_x, min_y) to (max_x, max_y), both corners included.
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// `width` x `height` pixels with the top-left corner at (x, y).
    pub const fn from_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    pub fn width(&self) -> i32 {
        (self.max_x - self.min_x + 1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.max_y - self.min_y + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// True when every pixel of `other` lies inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.min_x >= self.min_x
                && other.max_x <= self.max_x
                && other.min_y >= self.min_y
                && other.max_y <= self.max_y)
    }

    /// Overlap of the two rectangles; possibly empty.
    #[must_use]
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.max(other.min_x),
            max_x: self.max_x.min(other.max_x),
            min_y: self.min_y.max(other.min_y),
            max_y: self.max_y.min(other.max_y),
        }
    }
}
