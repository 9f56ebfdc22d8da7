//! Wire messages exchanged with the whiteboard relay.
//!
//! Every frame is a UTF-8 JSON object with a `type` field. Outbound frames
//! are [`ClientMessage`]s, inbound frames decode into [`ServerMessage`]s.

use crate::elements::{
    Arrow, Brush, Circle, ColorParseError, Element, ElementKind, ElementStyle, FONT_SCALE, Freehand,
    Line, Rectangle, SerializableColor, Text,
};
use crate::tools::ToolKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stroke width assumed when a remote frame omits it.
pub const DEFAULT_WIRE_STROKE_WIDTH: u32 = 2;

/// Errors decoding or encoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown element type: {0:?}")]
    UnknownElementType(String),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error("{0} element carries no path")]
    MissingPath(String),
    #[error("text element carries no content")]
    MissingText,
    #[error("segment needs two points, got {0}")]
    ShortSegment(usize),
}

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Newest segment of a freehand stroke in progress.
    Draw {
        path: [Point; 2],
        color: SerializableColor,
        size: u32,
        opacity: f64,
        tool: ToolKind,
    },
    /// A committed element.
    AddElement(ElementDescriptor),
    /// Local pointer position in canvas coordinates.
    CursorMove { x: f64, y: f64 },
    /// Wipe the board for everyone.
    Clear,
}

impl ClientMessage {
    pub fn draw(from: Point, to: Point, style: &ElementStyle, tool: ToolKind) -> Self {
        ClientMessage::Draw {
            path: [from, to],
            color: style.stroke_color,
            size: style.stroke_width,
            opacity: style.opacity,
            tool,
        }
    }

    pub fn add_element(element: &Element) -> Self {
        ClientMessage::AddElement(ElementDescriptor::from_element(element))
    }

    pub fn cursor_move(position: Point) -> Self {
        ClientMessage::CursorMove {
            x: position.x,
            y: position.y,
        }
    }

    /// The `type` tag this message travels under.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Draw { .. } => "draw",
            ClientMessage::AddElement(_) => "add_element",
            ClientMessage::CursorMove { .. } => "cursor_move",
            ClientMessage::Clear => "clear",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full board contents, sent once after connecting.
    InitialState {
        #[serde(default)]
        elements: Vec<ElementDescriptor>,
    },
    /// A peer's freehand segment.
    DrawUpdate(DrawUpdate),
    /// A peer committed an element (or our own `add_element`, echoed).
    ElementAdded(ElementDescriptor),
    CursorUpdate {
        user: String,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    UserJoined {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    UserLeft {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    WhiteboardCleared,
    Error {
        #[serde(default)]
        message: String,
    },
    /// Any `type` this client does not handle.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Element description as carried by `add_element`, `element_added` and
/// each entry of `initial_state`.
///
/// Shapes travel as `x, y` (start point) plus a signed `width, height`
/// extent; text as an anchor plus content; freehand strokes as a point list,
/// either inline under `path` or as a JSON string under `path_data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementDescriptor {
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(alias = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_width",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_data: Option<String>,
    #[serde(default, alias = "created_by", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ElementDescriptor {
    /// Describe a committed element for `add_element`.
    pub fn from_element(element: &Element) -> Self {
        let style = element.style();
        let mut descriptor = Self {
            element_id: Some(element.id().to_string()),
            color: Some(style.stroke_color.to_hex()),
            stroke_width: Some(style.stroke_width),
            opacity: Some(style.opacity),
            ..Self::default()
        };
        let (origin, extent) = match element {
            Element::Freehand(stroke) => {
                descriptor.element_type = stroke.brush.wire_name().to_string();
                descriptor.path = Some(stroke.points.clone());
                let bounds = stroke.bounds();
                (bounds.origin(), Some(Vec2::new(bounds.width(), bounds.height())))
            }
            Element::Line(line) => (line.start, Some(line.end - line.start)),
            Element::Arrow(arrow) => (arrow.start, Some(arrow.end - arrow.start)),
            Element::Rectangle(rect) => (rect.origin, Some(Vec2::new(rect.width, rect.height))),
            Element::Circle(circle) => (circle.origin, Some(Vec2::new(circle.width, circle.height))),
            Element::Text(text) => {
                descriptor.text_content = Some(text.content.clone());
                descriptor.font_size = Some(text.font_size);
                (text.position, None)
            }
        };
        if descriptor.element_type.is_empty() {
            descriptor.element_type = element.kind().wire_name().to_string();
        }
        descriptor.x = Some(origin.x);
        descriptor.y = Some(origin.y);
        if let Some(extent) = extent {
            descriptor.width = Some(extent.x);
            descriptor.height = Some(extent.y);
        }
        descriptor
    }

    /// Rebuild the element this descriptor describes.
    ///
    /// Missing coordinates read as zero, a missing color as black and a
    /// missing width as [`DEFAULT_WIRE_STROKE_WIDTH`].
    pub fn to_element(&self) -> Result<Element, ProtocolError> {
        let kind = ElementKind::from_wire_name(&self.element_type)
            .ok_or_else(|| ProtocolError::UnknownElementType(self.element_type.clone()))?;
        let style = self.style()?;
        let id = self
            .element_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(Uuid::new_v4);
        let origin = Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0));
        let width = self.width.unwrap_or(0.0);
        let height = self.height.unwrap_or(0.0);
        let far = origin + Vec2::new(width, height);

        let element = match kind {
            ElementKind::Freehand => {
                let points = decode_path(self.path.as_ref(), self.path_data.as_deref())?
                    .ok_or_else(|| ProtocolError::MissingPath(self.element_type.clone()))?;
                let brush = Brush::from_wire_name(&self.element_type);
                Element::Freehand(Freehand::reconstruct(id, points, brush, style))
            }
            ElementKind::Line => Element::Line(Line::reconstruct(id, origin, far, style)),
            ElementKind::Arrow => Element::Arrow(Arrow::reconstruct(id, origin, far, style)),
            ElementKind::Rectangle => {
                Element::Rectangle(Rectangle::reconstruct(id, origin, width, height, style))
            }
            ElementKind::Circle => Element::Circle(Circle::reconstruct(id, origin, width, height, style)),
            ElementKind::Text => {
                let content = self
                    .text_content
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ProtocolError::MissingText)?;
                let font_size = self
                    .font_size
                    .filter(|size| *size > 0.0)
                    .unwrap_or(f64::from(style.stroke_width) * FONT_SCALE);
                Element::Text(Text::reconstruct(id, origin, content, font_size, style))
            }
        };
        Ok(element)
    }

    fn style(&self) -> Result<ElementStyle, ProtocolError> {
        Ok(ElementStyle::new(
            parse_color(self.color.as_deref())?,
            self.stroke_width.unwrap_or(DEFAULT_WIRE_STROKE_WIDTH),
            self.opacity.unwrap_or(1.0),
        ))
    }
}

/// A peer's freehand segment (`draw_update`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Point>>,
    /// Older relays send the points as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_width",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_width: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_width",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl DrawUpdate {
    /// The segment to paint: the first two points of the path.
    pub fn segment(&self) -> Result<Segment, ProtocolError> {
        let points = decode_path(self.path.as_ref(), self.path_data.as_deref())?.unwrap_or_default();
        let [from, to, ..] = points.as_slice() else {
            return Err(ProtocolError::ShortSegment(points.len()));
        };
        let (from, to) = (*from, *to);
        let width = self
            .stroke_width
            .or(self.size)
            .unwrap_or(DEFAULT_WIRE_STROKE_WIDTH);
        let style = ElementStyle::new(parse_color(self.color.as_deref())?, width, self.opacity.unwrap_or(1.0));
        Ok(Segment { from, to, style })
    }
}

/// One two-point piece of a freehand stroke with its style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub style: ElementStyle,
}

/// Inline points win over `path_data`; `None` when neither is present.
fn decode_path(path: Option<&Vec<Point>>, path_data: Option<&str>) -> Result<Option<Vec<Point>>, ProtocolError> {
    if let Some(points) = path {
        return Ok(Some(points.clone()));
    }
    match path_data.map(str::trim).filter(|s| !s.is_empty()) {
        Some(data) => Ok(Some(serde_json::from_str(data)?)),
        None => Ok(None),
    }
}

fn parse_color(color: Option<&str>) -> Result<SerializableColor, ProtocolError> {
    match color {
        Some(hex) => SerializableColor::from_hex(hex).ok_or_else(|| ColorParseError(hex.to_string()).into()),
        None => Ok(SerializableColor::black()),
    }
}

/// Accepts integral or fractional widths (and `null`), rounding to `u32`.
fn lenient_width<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let width = Option::<f64>::deserialize(deserializer)?;
    Ok(width
        .filter(|w| w.is_finite())
        .map(|w| w.round().clamp(0.0, f64::from(u32::MAX)) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn to_value(msg: &ClientMessage) -> Value {
        serde_json::from_str(&msg.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_draw_message_shape() {
        let style = ElementStyle::new(SerializableColor::from_hex("#ff0000").unwrap(), 8, 0.5);
        let msg = ClientMessage::draw(Point::new(1.0, 2.0), Point::new(3.0, 4.0), &style, ToolKind::Brush);
        assert_eq!(
            to_value(&msg),
            json!({
                "type": "draw",
                "path": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}],
                "color": "#ff0000",
                "size": 8,
                "opacity": 0.5,
                "tool": "brush"
            })
        );
    }

    #[test]
    fn test_cursor_and_clear_messages() {
        let cursor = ClientMessage::cursor_move(Point::new(12.5, 7.0));
        assert_eq!(to_value(&cursor), json!({"type": "cursor_move", "x": 12.5, "y": 7.0}));
        assert_eq!(to_value(&ClientMessage::Clear), json!({"type": "clear"}));
    }

    #[test]
    fn test_add_element_rectangle_roundtrip() {
        let style = ElementStyle::new(SerializableColor::from_hex("#007bff").unwrap(), 4, 0.75);
        let rect = Element::Rectangle(Rectangle::from_corners(
            Point::new(10.0, 10.0),
            Point::new(100.0, 80.0),
            style,
        ));
        let value = to_value(&ClientMessage::add_element(&rect));
        assert_eq!(value["type"], "add_element");
        assert_eq!(value["element_type"], "rectangle");
        assert_eq!(value["x"], 10.0);
        assert_eq!(value["width"], 90.0);
        assert_eq!(value["height"], 70.0);
        assert_eq!(value["stroke_width"], 4);

        let echoed = value.to_string().replace("add_element", "element_added");
        let ServerMessage::ElementAdded(descriptor) = ServerMessage::parse(&echoed).unwrap() else {
            panic!("expected element_added");
        };
        let restored = descriptor.to_element().unwrap();
        assert_eq!(restored, rect);
    }

    #[test]
    fn test_text_descriptor() {
        let style = ElementStyle::new(SerializableColor::black(), 6, 1.0);
        let text = Element::Text(Text::new(Point::new(40.0, 60.0), "hello".to_string(), style));
        let value = to_value(&ClientMessage::add_element(&text));
        assert_eq!(value["text_content"], "hello");
        assert_eq!(value["font_size"], 18.0);
        assert!(value.get("width").is_none());
    }

    #[test]
    fn test_initial_state_uses_type_and_path_data() {
        let raw = json!({
            "type": "initial_state",
            "elements": [
                {
                    "id": "3",
                    "type": "pen",
                    "x": 0, "y": 0, "width": 0, "height": 0,
                    "color": "#333333",
                    "stroke_width": 3,
                    "path_data": "[{\"x\":1,\"y\":1},{\"x\":4,\"y\":5}]",
                    "text_content": "",
                    "font_size": 16,
                    "created_by": "alice"
                },
                {
                    "id": "4",
                    "type": "circle",
                    "x": 50, "y": 50, "width": 30, "height": 40,
                    "color": "#00ff00",
                    "stroke_width": 2.0,
                    "path_data": null,
                    "text_content": null,
                    "font_size": null,
                    "created_by": "bob"
                }
            ]
        });
        let ServerMessage::InitialState { elements } = ServerMessage::parse(&raw.to_string()).unwrap() else {
            panic!("expected initial_state");
        };
        assert_eq!(elements.len(), 2);
        let Element::Freehand(stroke) = elements[0].to_element().unwrap() else {
            panic!("expected freehand");
        };
        assert_eq!(stroke.points, vec![Point::new(1.0, 1.0), Point::new(4.0, 5.0)]);
        assert_eq!(stroke.style.stroke_width, 3);
        let Element::Circle(circle) = elements[1].to_element().unwrap() else {
            panic!("expected circle");
        };
        assert!((circle.radius() - 50.0).abs() < 1e-9);
        assert_eq!(elements[1].user.as_deref(), Some("bob"));
    }

    #[test]
    fn test_draw_update_fallbacks() {
        let inline = r##"{"type":"draw_update","path":[{"x":0,"y":0},{"x":5,"y":5}],"color":"#ff0000","size":7,"opacity":0.4}"##;
        let ServerMessage::DrawUpdate(update) = ServerMessage::parse(inline).unwrap() else {
            panic!("expected draw_update");
        };
        let segment = update.segment().unwrap();
        assert_eq!(segment.to, Point::new(5.0, 5.0));
        assert_eq!(segment.style.stroke_width, 7);

        let legacy = r##"{"type":"draw_update","element_id":null,"path_data":"[{\"x\":1,\"y\":2},{\"x\":3,\"y\":4}]","color":"#000000","stroke_width":2,"user":"carol"}"##;
        let ServerMessage::DrawUpdate(update) = ServerMessage::parse(legacy).unwrap() else {
            panic!("expected draw_update");
        };
        let segment = update.segment().unwrap();
        assert_eq!(segment.from, Point::new(1.0, 2.0));
        assert_eq!(segment.style.stroke_width, 2);
        assert!((segment.style.opacity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_update_needs_two_points() {
        let update = DrawUpdate {
            path: Some(vec![Point::new(1.0, 1.0)]),
            ..DrawUpdate::default()
        };
        assert!(matches!(update.segment(), Err(ProtocolError::ShortSegment(1))));
    }

    #[test]
    fn test_presence_messages() {
        let msg = ServerMessage::parse(r#"{"type":"cursor_update","user":"dave","x":3,"y":4}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::CursorUpdate {
                user: "dave".to_string(),
                x: 3.0,
                y: 4.0,
                color: None
            }
        );
        let msg = ServerMessage::parse(r#"{"type":"user_left","user":"dave","message":"dave left the room"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::UserLeft {
                user: Some("dave".to_string())
            }
        );
        let msg = ServerMessage::parse(r#"{"type":"user_joined"}"#).unwrap();
        assert_eq!(msg, ServerMessage::UserJoined { user: None });
    }

    #[test]
    fn test_cleared_unknown_and_error() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"whiteboard_cleared","user":"erin"}"#).unwrap(),
            ServerMessage::WhiteboardCleared
        );
        assert_eq!(
            ServerMessage::parse(r#"{"type":"erase_update","x":1,"y":2}"#).unwrap(),
            ServerMessage::Unknown
        );
        assert_eq!(
            ServerMessage::parse(r#"{"type":"error","message":"Invalid JSON format"}"#).unwrap(),
            ServerMessage::Error {
                message: "Invalid JSON format".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_frames_are_errors() {
        assert!(ServerMessage::parse("not json").is_err());
        assert!(ServerMessage::parse(r#"{"no_type":true}"#).is_err());
        let bad = ElementDescriptor {
            element_type: "hexagon".to_string(),
            ..ElementDescriptor::default()
        };
        assert!(matches!(bad.to_element(), Err(ProtocolError::UnknownElementType(_))));
        let bad_color = ElementDescriptor {
            element_type: "line".to_string(),
            color: Some("blue".to_string()),
            ..ElementDescriptor::default()
        };
        assert!(matches!(bad_color.to_element(), Err(ProtocolError::Color(_))));
    }
}
