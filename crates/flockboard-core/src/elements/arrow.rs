//! Arrow shape: a line with two head ticks at the end point.

use super::{ElementId, ElementStyle, points_bounds};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use uuid::Uuid;

/// Length of each arrowhead tick in canvas units.
pub const ARROW_HEAD_LENGTH: f64 = 20.0;
/// Angle between the shaft and each tick (30°).
pub const ARROW_HEAD_ANGLE: f64 = PI / 6.0;

/// An arrow shape (line with arrowhead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub(crate) id: ElementId,
    /// Start point.
    pub start: Point,
    /// End point (where the arrowhead points).
    pub end: Point,
    pub style: ElementStyle,
}

impl Arrow {
    pub fn new(start: Point, end: Point, style: ElementStyle) -> Self {
        Self::reconstruct(Uuid::new_v4(), start, end, style)
    }

    pub(crate) fn reconstruct(id: ElementId, start: Point, end: Point, style: ElementStyle) -> Self {
        Self { id, start, end, style }
    }

    /// Shaft angle in radians, measured from start to end.
    pub fn angle(&self) -> f64 {
        let d = self.end - self.start;
        d.y.atan2(d.x)
    }

    /// Outer endpoints of the two head ticks.
    pub fn head_points(&self) -> [Point; 2] {
        let angle = self.angle();
        let tick = |a: f64| self.end - Vec2::new(a.cos(), a.sin()) * ARROW_HEAD_LENGTH;
        [tick(angle - ARROW_HEAD_ANGLE), tick(angle + ARROW_HEAD_ANGLE)]
    }

    pub fn bounds(&self) -> Rect {
        let [left, right] = self.head_points();
        points_bounds(&[self.start, self.end, left, right])
    }

    /// Shaft followed by the two ticks, each as its own subpath.
    pub fn to_path(&self) -> BezPath {
        let [left, right] = self.head_points();
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path.move_to(self.end);
        path.line_to(left);
        path.move_to(self.end);
        path.line_to(right);
        path
    }
}
