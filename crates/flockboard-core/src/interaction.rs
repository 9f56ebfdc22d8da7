//! Pointer and keyboard interaction state machine.
//!
//! The controller never touches the surface or the network. Each input
//! returns the [`Effect`]s it causes, in the order they must be applied.

use crate::elements::{Element, ElementStyle, Freehand, Text};
use crate::input::{KeyEvent, PointerEvent, ShortcutAction, resolve_shortcut};
use crate::protocol::ClientMessage;
use crate::tools::{ToolKind, ToolSettings};
use crate::viewport::Viewport;
use kurbo::Point;

/// Something the session must do in response to input.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Capture the surface into history before a change begins.
    Snapshot,
    /// Paint a single freehand segment on top of the surface.
    PaintSegment {
        from: Point,
        to: Point,
        style: ElementStyle,
    },
    /// Clear a disc of the surface (canvas coordinates and units).
    Erase { center: Point, radius: f64 },
    /// Redraw everything, then the in-progress shape dashed at half opacity.
    Preview(Element),
    /// Paint one element on top of the surface.
    Paint(Element),
    /// Redraw everything from the collection.
    Redraw,
    /// Append a finished element to the collection.
    Commit(Element),
    /// Send a frame to the relay.
    Send(ClientMessage),
    Undo,
    Redo,
}

/// Pointer phase.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Pointer is down with a drawing tool.
    Drawing {
        tool: ToolKind,
        /// Canvas points so far (freehand tools only grow this).
        path: Vec<Point>,
        /// Canvas point where the gesture began.
        anchor: Point,
    },
    /// Pointer is down with the pan tool.
    Panning {
        /// Last pointer position, in screen coordinates.
        last: Point,
    },
}

/// The open text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    /// Canvas point the text will be anchored at.
    pub position: Point,
    /// Text typed so far.
    pub text: String,
}

/// Tool selection plus pointer phase plus the text overlay.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    tool: ToolKind,
    settings: ToolSettings,
    state: InteractionState,
    text_entry: Option<TextEntry>,
    viewport: Viewport,
    /// Last pointer position, in screen coordinates.
    pointer: Point,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ToolSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text_entry.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The freehand stroke being drawn, as it would be committed now.
    pub fn stroke_in_progress(&self) -> Option<Element> {
        let InteractionState::Drawing { tool, path, .. } = &self.state else {
            return None;
        };
        let brush = tool.brush()?;
        Some(Element::Freehand(Freehand::from_points(
            path.clone(),
            brush,
            self.settings.style(),
        )))
    }

    /// Select a tool. A gesture in progress is released at the last
    /// pointer position first, and the text overlay closes unless the new
    /// tool is the text tool.
    pub fn set_tool(&mut self, tool: ToolKind) -> Vec<Effect> {
        let effects = self.pointer_up(self.pointer);
        if self.tool != tool {
            log::debug!("tool: {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
        if tool != ToolKind::Text {
            self.text_entry = None;
        }
        effects
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<Effect> {
        let position = event.position();
        let effects = self.dispatch_pointer(event);
        self.pointer = position;
        effects
    }

    fn dispatch_pointer(&mut self, event: PointerEvent) -> Vec<Effect> {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } | PointerEvent::Leave { position } => self.pointer_up(position),
        }
    }

    fn pointer_down(&mut self, screen: Point) -> Vec<Effect> {
        // A press without a release first finishes the earlier gesture.
        let mut effects = if self.state == InteractionState::Idle {
            Vec::new()
        } else {
            self.pointer_up(screen)
        };
        let canvas = self.viewport.screen_to_canvas(screen);
        match self.tool {
            ToolKind::Pan => {
                self.state = InteractionState::Panning { last: screen };
            }
            ToolKind::Text => {
                let text = self.text_entry.take().map(|entry| entry.text).unwrap_or_default();
                self.text_entry = Some(TextEntry { position: canvas, text });
            }
            ToolKind::Select => {}
            tool => {
                self.state = InteractionState::Drawing {
                    tool,
                    path: vec![canvas],
                    anchor: canvas,
                };
                effects.push(Effect::Snapshot);
            }
        }
        effects
    }

    fn pointer_move(&mut self, screen: Point) -> Vec<Effect> {
        let canvas = self.viewport.screen_to_canvas(screen);
        let mut effects = vec![Effect::Send(ClientMessage::cursor_move(canvas))];
        let style = self.settings.style();
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
                effects.push(Effect::Redraw);
            }
            InteractionState::Drawing { tool, path, anchor } => {
                if tool.is_freehand() {
                    let from = path.last().copied().unwrap_or(*anchor);
                    path.push(canvas);
                    effects.push(Effect::PaintSegment {
                        from,
                        to: canvas,
                        style,
                    });
                    effects.push(Effect::Send(ClientMessage::draw(from, canvas, &style, *tool)));
                } else if *tool == ToolKind::Eraser {
                    effects.push(Effect::Erase {
                        center: canvas,
                        radius: f64::from(self.settings.size),
                    });
                } else if let Some(shape) = tool
                    .shape_kind()
                    .and_then(|kind| Element::from_drag(kind, *anchor, canvas, style))
                {
                    effects.push(Effect::Preview(shape));
                }
            }
        }
        effects
    }

    fn pointer_up(&mut self, screen: Point) -> Vec<Effect> {
        let canvas = self.viewport.screen_to_canvas(screen);
        let style = self.settings.style();
        match std::mem::take(&mut self.state) {
            InteractionState::Idle | InteractionState::Panning { .. } => Vec::new(),
            InteractionState::Drawing { tool, path, anchor } => {
                if let Some(brush) = tool.brush() {
                    let stroke = Freehand::from_points(path, brush, style);
                    return vec![Effect::Commit(Element::Freehand(stroke))];
                }
                let Some(shape) = tool
                    .shape_kind()
                    .and_then(|kind| Element::from_drag(kind, anchor, canvas, style))
                else {
                    // Eraser: the surface is already changed, nothing to keep.
                    return Vec::new();
                };
                let message = ClientMessage::add_element(&shape);
                vec![Effect::Commit(shape), Effect::Redraw, Effect::Send(message)]
            }
        }
    }

    /// Handle a key press. While the text overlay is open, keys edit the
    /// text and shortcuts are off.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Vec<Effect> {
        if let Some(entry) = self.text_entry.as_mut() {
            match event.key.as_str() {
                "Enter" => {
                    let text = entry.text.clone();
                    return self.confirm_text(&text);
                }
                "Escape" => self.cancel_text(),
                "Backspace" => {
                    entry.text.pop();
                }
                key if !event.modifiers.command() && key.chars().count() == 1 => {
                    entry.text.push_str(key);
                }
                _ => {}
            }
            return Vec::new();
        }
        match resolve_shortcut(event) {
            Some(ShortcutAction::Undo) => vec![Effect::Undo],
            Some(ShortcutAction::Redo) => vec![Effect::Redo],
            Some(ShortcutAction::SelectTool(tool)) => self.set_tool(tool),
            None => Vec::new(),
        }
    }

    /// Confirm the text overlay with `text`. Blank text just closes it.
    pub fn confirm_text(&mut self, text: &str) -> Vec<Effect> {
        let Some(entry) = self.text_entry.take() else {
            return Vec::new();
        };
        let content = text.trim();
        if content.is_empty() {
            return Vec::new();
        }
        let element = Element::Text(Text::new(entry.position, content.to_string(), self.settings.style()));
        let message = ClientMessage::add_element(&element);
        vec![
            Effect::Snapshot,
            Effect::Paint(element.clone()),
            Effect::Commit(element),
            Effect::Send(message),
        ]
    }

    pub fn cancel_text(&mut self) {
        self.text_entry = None;
    }

    pub fn zoom_in(&mut self) -> Vec<Effect> {
        self.viewport.zoom_in();
        vec![Effect::Redraw]
    }

    pub fn zoom_out(&mut self) -> Vec<Effect> {
        self.viewport.zoom_out();
        vec![Effect::Redraw]
    }

    pub fn reset_zoom(&mut self) -> Vec<Effect> {
        self.viewport.reset();
        vec![Effect::Redraw]
    }
}
