//! Circle defined by a center and a point on its rim.

use super::{ElementId, ElementStyle};
use kurbo::{BezPath, Circle as KurboCircle, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A circle centered on the drag anchor.
///
/// Stored like a rectangle (origin plus extent) so it travels in the same
/// wire fields; the radius is the length of the extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: ElementId,
    /// Center of the circle.
    pub origin: Point,
    /// Horizontal offset from the center to the rim point.
    pub width: f64,
    /// Vertical offset from the center to the rim point.
    pub height: f64,
    pub style: ElementStyle,
}

impl Circle {
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

    pub fn from_drag(center: Point, rim: Point, style: ElementStyle) -> Self {
        let extent = rim - center;
        Self::new(center, extent.x, extent.y, style)
    }

    pub fn radius(&self) -> f64 {
        Vec2::new(self.width, self.height).hypot()
    }

    pub fn bounds(&self) -> Rect {
        KurboCircle::new(self.origin, self.radius()).bounding_box()
    }

    pub fn to_path(&self) -> BezPath {
        KurboCircle::new(self.origin, self.radius()).to_path(0.1)
    }
}
