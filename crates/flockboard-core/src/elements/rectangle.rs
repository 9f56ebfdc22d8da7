//! Axis-aligned rectangle.

use super::{ElementId, ElementStyle};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rectangle stored as origin plus a signed extent.
///
/// A drag up or to the left produces a negative width or height; the
/// box normalizes when drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ElementId,
    /// Corner where the drag started.
    pub origin: Point,
    /// Signed horizontal extent.
    pub width: f64,
    /// Signed vertical extent.
    pub height: f64,
    pub style: ElementStyle,
}

impl Rectangle {
    pub fn new(origin: Point, width: f64, height: f64, style: ElementStyle) -> Self {
        Self::reconstruct(Uuid::new_v4(), origin, width, height, style)
    }

    pub(crate) fn reconstruct(id: ElementId, origin: Point, width: f64, height: f64, style: ElementStyle) -> Self {
        Self {
            id,
            origin,
            width,
            height,
            style,
        }
    }

    /// Create a rectangle from the drag anchor and release point.
    pub fn from_corners(anchor: Point, release: Point, style: ElementStyle) -> Self {
        let extent = release - anchor;
        Self::new(anchor, extent.x, extent.y, style)
    }

    /// The corner opposite the origin.
    pub fn far_corner(&self) -> Point {
        self.origin + Vec2::new(self.width, self.height)
    }

    /// Normalized box.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.origin, self.far_corner())
    }

    pub fn to_path(&self) -> BezPath {
        self.rect().to_path(0.1)
    }
}
