//! Drawn element definitions for the whiteboard.

mod arrow;
mod circle;
mod freehand;
mod line;
mod rectangle;
mod text;

pub use arrow::{ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH, Arrow};
pub use circle::Circle;
pub use freehand::{Brush, Freehand};
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::{FONT_SCALE, GLYPH_ADVANCE, Text};

use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Thinnest stroke a tool can produce.
pub const MIN_STROKE_WIDTH: u32 = 1;
/// Thickest stroke a tool can produce.
pub const MAX_STROKE_WIDTH: u32 = 50;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// A color string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color: {0:?}")]
pub struct ColorParseError(pub String);

/// Serializable color representation (RGBA8).
///
/// Travels as a CSS hex string (`#rrggbb`, or `#rrggbbaa` when not opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::new(channels[0], channels[1], channels[2], 255))
            }
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Format as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or(ColorParseError(value))
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_hex()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by every element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    /// Stroke color (also the fill color for text).
    pub stroke_color: SerializableColor,
    /// Stroke width in canvas units, 1 to 50.
    pub stroke_width: u32,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ElementStyle {
    /// Build a style, clamping width and opacity into range.
    pub fn new(stroke_color: SerializableColor, stroke_width: u32, opacity: f64) -> Self {
        Self {
            stroke_color,
            stroke_width: clamp_stroke_width(stroke_width),
            opacity: clamp_opacity(opacity),
        }
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 5,
            opacity: 1.0,
        }
    }
}

pub fn clamp_stroke_width(width: u32) -> u32 {
    width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
}

/// Clamp an opacity into 0..=1, mapping NaN to fully opaque.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

/// The kinds of element that can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Freehand,
    Line,
    Rectangle,
    Circle,
    Arrow,
    Text,
}

impl ElementKind {
    /// Map a wire `element_type`/`type` string to a kind.
    ///
    /// `pen` and `brush` are the freehand tools' names.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "pen" | "brush" | "freehand" => Some(ElementKind::Freehand),
            "line" => Some(ElementKind::Line),
            "rectangle" => Some(ElementKind::Rectangle),
            "circle" => Some(ElementKind::Circle),
            "arrow" => Some(ElementKind::Arrow),
            "text" => Some(ElementKind::Text),
            _ => None,
        }
    }

    /// Wire name for kinds whose name does not depend on the brush.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ElementKind::Freehand => "pen",
            ElementKind::Line => "line",
            ElementKind::Rectangle => "rectangle",
            ElementKind::Circle => "circle",
            ElementKind::Arrow => "arrow",
            ElementKind::Text => "text",
        }
    }
}

/// A committed drawn object.
///
/// Elements are never edited in place once they enter a collection;
/// a change produces a new element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Freehand(Freehand),
    Line(Line),
    Rectangle(Rectangle),
    Circle(Circle),
    Arrow(Arrow),
    Text(Text),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Freehand(e) => e.id,
            Element::Line(e) => e.id,
            Element::Rectangle(e) => e.id,
            Element::Circle(e) => e.id,
            Element::Arrow(e) => e.id,
            Element::Text(e) => e.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Freehand(_) => ElementKind::Freehand,
            Element::Line(_) => ElementKind::Line,
            Element::Rectangle(_) => ElementKind::Rectangle,
            Element::Circle(_) => ElementKind::Circle,
            Element::Arrow(_) => ElementKind::Arrow,
            Element::Text(_) => ElementKind::Text,
        }
    }

    pub fn style(&self) -> &ElementStyle {
        match self {
            Element::Freehand(e) => &e.style,
            Element::Line(e) => &e.style,
            Element::Rectangle(e) => &e.style,
            Element::Circle(e) => &e.style,
            Element::Arrow(e) => &e.style,
            Element::Text(e) => &e.style,
        }
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        match self {
            Element::Freehand(e) => e.bounds(),
            Element::Line(e) => e.bounds(),
            Element::Rectangle(e) => e.rect(),
            Element::Circle(e) => e.bounds(),
            Element::Arrow(e) => e.bounds(),
            Element::Text(e) => e.bounds(),
        }
    }

    /// Stroke outline in canvas coordinates (empty for text).
    pub fn to_path(&self) -> BezPath {
        match self {
            Element::Freehand(e) => e.to_path(),
            Element::Line(e) => e.to_path(),
            Element::Rectangle(e) => e.to_path(),
            Element::Circle(e) => e.to_path(),
            Element::Arrow(e) => e.to_path(),
            Element::Text(_) => BezPath::new(),
        }
    }

    /// Build the shape a two-point gesture produces for a shape kind.
    ///
    /// Returns `None` for freehand and text, which are not drag-defined.
    pub fn from_drag(kind: ElementKind, start: Point, end: Point, style: ElementStyle) -> Option<Self> {
        match kind {
            ElementKind::Line => Some(Element::Line(Line::new(start, end, style))),
            ElementKind::Rectangle => Some(Element::Rectangle(Rectangle::from_corners(start, end, style))),
            ElementKind::Circle => Some(Element::Circle(Circle::from_drag(start, end, style))),
            ElementKind::Arrow => Some(Element::Arrow(Arrow::new(start, end, style))),
            ElementKind::Freehand | ElementKind::Text => None,
        }
    }
}

/// Bounding box of a run of points.
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
}

/// Polyline through a run of points.
pub(crate) fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }
    }
    path
}
