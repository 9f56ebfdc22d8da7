//! Freehand strokes drawn with the pen or brush.

use super::{ElementId, ElementStyle, points_bounds, polyline};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The freehand tool a stroke was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Brush {
    #[default]
    Pen,
    Brush,
}

impl Brush {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Brush::Pen => "pen",
            Brush::Brush => "brush",
        }
    }

    /// Anything that is not `brush` is treated as a pen stroke.
    pub fn from_wire_name(name: &str) -> Self {
        if name == "brush" { Brush::Brush } else { Brush::Pen }
    }
}

/// A freehand drawing (series of points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ElementId,
    /// Points in the freehand path, in canvas coordinates.
    pub points: Vec<Point>,
    /// Tool the stroke was drawn with.
    #[serde(default)]
    pub brush: Brush,
    /// Style properties.
    pub style: ElementStyle,
}

impl Freehand {
    /// Create from recorded points.
    pub fn from_points(points: Vec<Point>, brush: Brush, style: ElementStyle) -> Self {
        Self::reconstruct(Uuid::new_v4(), points, brush, style)
    }

    pub(crate) fn reconstruct(id: ElementId, points: Vec<Point>, brush: Brush, style: ElementStyle) -> Self {
        Self {
            id,
            points,
            brush,
            style,
        }
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A single-point stroke has nothing to paint.
    pub fn is_paintable(&self) -> bool {
        self.points.len() > 1
    }

    pub fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    pub fn to_path(&self) -> BezPath {
        if self.is_paintable() {
            polyline(&self.points)
        } else {
            BezPath::new()
        }
    }
}
