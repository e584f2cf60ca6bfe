//! Core geometry and identity types shared across frames, tags and stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash: the first 256 bits of a SHA-512 digest
pub type Hash = [u8; 32];

/// Pixel coordinate, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangular sub-area of a frame
///
/// Width and height are the canonical encoding. The opposite corner is derived and
/// exclusive: a region at (10, 20) of size 5x5 covers x in 10..15 and y in 20..25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(origin: impl Into<Point>, width: u32, height: u32) -> Self {
        Self {
            origin: origin.into(),
            width,
            height,
        }
    }

    /// Build a region from any two opposite corners.
    pub fn from_corners(a: impl Into<Point>, b: impl Into<Point>) -> Self {
        let (a, b) = (a.into(), b.into());
        let origin = Point::new(a.x.min(b.x), a.y.min(b.y));
        Self {
            origin,
            width: a.x.max(b.x) - origin.x,
            height: a.y.max(b.y) - origin.y,
        }
    }

    pub fn opposite_corner(&self) -> Point {
        Point::new(
            self.origin.x.saturating_add(self.width),
            self.origin.y.saturating_add(self.height),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies entirely inside a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let corner = self.opposite_corner();
        corner.x <= width && corner.y <= height
    }

    /// Grow or shrink the region about its centre, clamped to a `bound_width` x
    /// `bound_height` frame.
    ///
    /// Used to take a margin around a detected face before cropping it.
    pub fn scale_from_center(&self, scale: f64, bound_width: u32, bound_height: u32) -> Region {
        let cx = self.origin.x as f64 + self.width as f64 / 2.0;
        let cy = self.origin.y as f64 + self.height as f64 / 2.0;
        let half_w = self.width as f64 * scale / 2.0;
        let half_h = self.height as f64 * scale / 2.0;

        let x0 = (cx - half_w).round().max(0.0) as u32;
        let y0 = (cy - half_h).round().max(0.0) as u32;
        let x1 = ((cx + half_w).round() as u32).min(bound_width);
        let y1 = ((cy + half_h).round() as u32).min(bound_height);

        Region {
            origin: Point::new(x0.min(x1), y0.min(y1)),
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.origin, self.width, self.height)
    }
}
