//! Tool selection and the style applied to new elements.

use crate::elements::{
    Brush, ElementKind, ElementStyle, SerializableColor, clamp_opacity, clamp_stroke_width,
};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Pen,
    Brush,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Arrow,
    Text,
    Pan,
    Select,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Pen,
        ToolKind::Brush,
        ToolKind::Eraser,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Arrow,
        ToolKind::Text,
        ToolKind::Pan,
        ToolKind::Select,
    ];

    /// Name used on the wire and by the toolbar.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Brush => "brush",
            ToolKind::Eraser => "eraser",
            ToolKind::Line => "line",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Arrow => "arrow",
            ToolKind::Text => "text",
            ToolKind::Pan => "pan",
            ToolKind::Select => "select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// The freehand brush this tool draws with, if it is a freehand tool.
    pub fn brush(&self) -> Option<Brush> {
        match self {
            ToolKind::Pen => Some(Brush::Pen),
            ToolKind::Brush => Some(Brush::Brush),
            _ => None,
        }
    }

    /// The element kind a drag with this tool produces, for shape tools.
    pub fn shape_kind(&self) -> Option<ElementKind> {
        match self {
            ToolKind::Line => Some(ElementKind::Line),
            ToolKind::Rectangle => Some(ElementKind::Rectangle),
            ToolKind::Circle => Some(ElementKind::Circle),
            ToolKind::Arrow => Some(ElementKind::Arrow),
            _ => None,
        }
    }

    pub fn is_freehand(&self) -> bool {
        self.brush().is_some()
    }

    pub fn is_shape(&self) -> bool {
        self.shape_kind().is_some()
    }
}

impl From<Brush> for ToolKind {
    fn from(brush: Brush) -> Self {
        match brush {
            Brush::Pen => ToolKind::Pen,
            Brush::Brush => ToolKind::Brush,
        }
    }
}

/// The current color, size and opacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub color: SerializableColor,
    /// Brush size, 1 to 50. Stroke width for shapes, eraser radius for the eraser.
    pub size: u32,
    pub opacity: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let style = ElementStyle::default();
        Self {
            color: style.stroke_color,
            size: style.stroke_width,
            opacity: style.opacity,
        }
    }
}

impl ToolSettings {
    pub fn set_color(&mut self, color: SerializableColor) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = clamp_stroke_width(size);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = clamp_opacity(opacity);
    }

    /// Style for the next committed element.
    pub fn style(&self) -> ElementStyle {
        ElementStyle::new(self.color, self.size, self.opacity)
    }
}

impl From<ElementStyle> for ToolSettings {
    fn from(style: ElementStyle) -> Self {
        Self {
            color: style.stroke_color,
            size: style.stroke_width,
            opacity: style.opacity,
        }
    }
}
