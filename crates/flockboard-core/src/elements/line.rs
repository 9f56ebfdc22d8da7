//! Straight line segment.

use super::{ElementId, ElementStyle, points_bounds, polyline};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A straight line between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ElementId,
    pub start: Point,
    pub end: Point,
    pub style: ElementStyle,
}

impl Line {
    pub fn new(start: Point, end: Point, style: ElementStyle) -> Self {
        Self::reconstruct(Uuid::new_v4(), start, end, style)
    }

    pub(crate) fn reconstruct(id: ElementId, start: Point, end: Point, style: ElementStyle) -> Self {
        Self { id, start, end, style }
    }

    pub fn points(&self) -> [Point; 2] {
        [self.start, self.end]
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn bounds(&self) -> Rect {
        points_bounds(&self.points())
    }

    pub fn to_path(&self) -> BezPath {
        polyline(&self.points())
    }
}
