//! Text runs placed at an anchor point.

use super::{ElementId, ElementStyle};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font size is the stroke width times this factor.
pub const FONT_SCALE: f64 = 3.0;

/// Average glyph advance as a fraction of the font size.
pub const GLYPH_ADVANCE: f64 = 0.6;

/// A single line of text anchored at its baseline start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ElementId,
    /// Baseline start, in canvas coordinates.
    pub position: Point,
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f64,
    pub style: ElementStyle,
}

impl Text {
    /// Create a text element sized from the style's stroke width.
    pub fn new(position: Point, content: String, style: ElementStyle) -> Self {
        let font_size = f64::from(style.stroke_width) * FONT_SCALE;
        Self::reconstruct(Uuid::new_v4(), position, content, font_size, style)
    }

    pub(crate) fn reconstruct(
        id: ElementId,
        position: Point,
        content: String,
        font_size: f64,
        style: ElementStyle,
    ) -> Self {
        Self {
            id,
            position,
            content,
            font_size,
            style,
        }
    }

    /// Approximate extent: one line above the baseline.
    pub fn bounds(&self) -> Rect {
        let width = self.content.chars().count() as f64 * self.font_size * GLYPH_ADVANCE;
        Rect::new(
            self.position.x,
            self.position.y - self.font_size,
            self.position.x + width,
            self.position.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_from_stroke_width() {
        let style = ElementStyle {
            stroke_width: 8,
            ..ElementStyle::default()
        };
        let text = Text::new(Point::new(0.0, 50.0), "hi".to_string(), style);
        assert!((text.font_size - 24.0).abs() < f64::EPSILON);
        assert!((text.bounds().y0 - 26.0).abs() < f64::EPSILON);
    }
}
