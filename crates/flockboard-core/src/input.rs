//! Pointer and keyboard events, and the keyboard shortcut map.

use crate::tools::ToolKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
///
/// Touch input maps onto the same events (first touch point only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// Pointer left the surface; handled like a release.
    Leave { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position }
            | PointerEvent::Leave { position } => *position,
        }
    }
}

/// Key press with the modifiers held at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Logical key value, e.g. `"z"` or `"Enter"`.
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    /// A key pressed with no modifiers.
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// What a key press asks the whiteboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    SelectTool(ToolKind),
}

/// Map a key press to an action.
///
/// With the command modifier held only undo/redo are recognized; tool
/// letters are matched without it.
pub fn resolve_shortcut(event: &KeyEvent) -> Option<ShortcutAction> {
    let key = event.key.to_ascii_lowercase();
    if event.modifiers.command() {
        return match key.as_str() {
            "z" if event.modifiers.shift => Some(ShortcutAction::Redo),
            "z" => Some(ShortcutAction::Undo),
            "y" => Some(ShortcutAction::Redo),
            _ => None,
        };
    }
    // Shift+letter arrives uppercase; only bare letters pick tools.
    if event.modifiers.shift || event.modifiers.alt || event.key != key {
        return None;
    }
    let tool = match key.as_str() {
        "p" => ToolKind::Pen,
        "b" => ToolKind::Brush,
        "e" => ToolKind::Eraser,
        "l" => ToolKind::Line,
        "r" => ToolKind::Rectangle,
        "c" => ToolKind::Circle,
        "t" => ToolKind::Text,
        "s" => ToolKind::Select,
        _ => return None,
    };
    Some(ShortcutAction::SelectTool(tool))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn test_tool_letters() {
        let cases = [
            ("p", ToolKind::Pen),
            ("b", ToolKind::Brush),
            ("e", ToolKind::Eraser),
            ("l", ToolKind::Line),
            ("r", ToolKind::Rectangle),
            ("c", ToolKind::Circle),
            ("t", ToolKind::Text),
            ("s", ToolKind::Select),
        ];
        for (key, tool) in cases {
            assert_eq!(
                resolve_shortcut(&KeyEvent::plain(key)),
                Some(ShortcutAction::SelectTool(tool)),
                "key {key}"
            );
        }
        assert_eq!(resolve_shortcut(&KeyEvent::plain("x")), None);
    }

    #[test]
    fn test_undo_redo_chords() {
        assert_eq!(resolve_shortcut(&KeyEvent::new("z", ctrl())), Some(ShortcutAction::Undo));
        let ctrl_shift = Modifiers { shift: true, ..ctrl() };
        assert_eq!(resolve_shortcut(&KeyEvent::new("Z", ctrl_shift)), Some(ShortcutAction::Redo));
        assert_eq!(resolve_shortcut(&KeyEvent::new("y", ctrl())), Some(ShortcutAction::Redo));
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(resolve_shortcut(&KeyEvent::new("z", meta)), Some(ShortcutAction::Undo));
    }

    #[test]
    fn test_command_letters_do_not_pick_tools() {
        assert_eq!(resolve_shortcut(&KeyEvent::new("c", ctrl())), None);
        assert_eq!(resolve_shortcut(&KeyEvent::plain("P")), None);
    }
}
