//! Line commands understood by the headless client.

use flockboard_core::elements::SerializableColor;
use flockboard_core::input::{KeyEvent, Modifiers};
use flockboard_core::tools::ToolKind;
use kurbo::Point;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown tool: {0}")]
    Tool(String),
}

/// Which way the pointer went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tool(ToolKind),
    Color(SerializableColor),
    Size(u32),
    Opacity(f64),
    Pointer(PointerPhase, Point),
    Key(KeyEvent),
    Text(String),
    Undo,
    Redo,
    Clear,
    Grid,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Save(String),
    Load(String),
    List,
    Export(PathBuf),
    Status,
    Help,
    Quit,
}

/// Command help, one `(usage, description)` pair per command.
pub const HELP: &[(&str, &str)] = &[
    ("tool <name>", "Select pen, brush, eraser, line, rectangle, circle, arrow, text, pan or select"),
    ("color <#rrggbb>", "Set the stroke color"),
    ("size <1-50>", "Set the stroke width"),
    ("opacity <0-1>", "Set the opacity"),
    ("down|move|up <x> <y>", "Pointer input in screen coordinates"),
    ("key [ctrl+][shift+]<name>", "Key press (e.g. r, ctrl+z, Enter, Escape)"),
    ("text <content>", "Confirm the open text entry"),
    ("undo / redo", "Step through history"),
    ("clear", "Clear the board for everyone"),
    ("grid", "Toggle the grid"),
    ("zoom in|out|reset", "Change the zoom"),
    ("save <name> / load <name>", "Named snapshots"),
    ("list", "List named snapshots"),
    ("export <path.png>", "Export the surface as PNG"),
    ("status", "Connection and board summary"),
    ("quit", "Leave the room"),
];

impl Command {
    /// Parse one line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if name.is_empty() {
            return Ok(None);
        }
        let rest = rest.trim();
        let command = match name {
            "tool" => Command::Tool(ToolKind::from_name(rest).ok_or_else(|| CommandError::Tool(rest.to_string()))?),
            "color" => Command::Color(SerializableColor::from_hex(rest).ok_or(CommandError::Usage("color <#rrggbb>"))?),
            "size" => Command::Size(rest.parse().map_err(|_| CommandError::Usage("size <1-50>"))?),
            "opacity" => Command::Opacity(rest.parse().map_err(|_| CommandError::Usage("opacity <0-1>"))?),
            "down" => Command::Pointer(PointerPhase::Down, parse_point(rest)?),
            "move" => Command::Pointer(PointerPhase::Move, parse_point(rest)?),
            "up" => Command::Pointer(PointerPhase::Up, parse_point(rest)?),
            "key" if !rest.is_empty() => Command::Key(parse_key(rest)),
            "key" => return Err(CommandError::Usage("key <name>")),
            "text" => Command::Text(rest.to_string()),
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "clear" => Command::Clear,
            "grid" => Command::Grid,
            "zoom" => match rest {
                "in" | "+" => Command::ZoomIn,
                "out" | "-" => Command::ZoomOut,
                "reset" | "0" => Command::ResetZoom,
                _ => return Err(CommandError::Usage("zoom in|out|reset")),
            },
            "save" if !rest.is_empty() => Command::Save(rest.to_string()),
            "load" if !rest.is_empty() => Command::Load(rest.to_string()),
            "save" | "load" => return Err(CommandError::Usage("save|load <name>")),
            "list" => Command::List,
            "export" if !rest.is_empty() => Command::Export(PathBuf::from(rest)),
            "export" => return Err(CommandError::Usage("export <path.png>")),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_point(args: &str) -> Result<Point, CommandError> {
    let mut parts = args.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok(Point::new(x, y)),
        _ => Err(CommandError::Usage("down|move|up <x> <y>")),
    }
}

/// `ctrl+shift+z` style chords. A lone `+` is the plus key.
fn parse_key(chord: &str) -> KeyEvent {
    let mut modifiers = Modifiers::NONE;
    let mut parts: Vec<&str> = chord.split('+').collect();
    let key = match parts.pop() {
        Some("") | None => "+",
        Some(key) => key,
    };
    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            "alt" | "option" => modifiers.alt = true,
            "meta" | "cmd" | "super" => modifiers.meta = true,
            _ => {}
        }
    }
    KeyEvent::new(key, modifiers)
}

/// Print the command list to stdout.
pub fn print_help() {
    println!("\n=== Commands ===");
    for (usage, description) in HELP {
        println!("  {:28} {}", usage, description);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(Command::parse("tool rectangle"), Ok(Some(Command::Tool(ToolKind::Rectangle))));
        assert_eq!(Command::parse("down 10 20.5"), Ok(Some(Command::Pointer(PointerPhase::Down, Point::new(10.0, 20.5)))));
        assert_eq!(Command::parse("zoom +"), Ok(Some(Command::ZoomIn)));
        assert_eq!(Command::parse("text hello world"), Ok(Some(Command::Text("hello world".into()))));
        assert_eq!(Command::parse("save  my board "), Ok(Some(Command::Save("my board".into()))));
        assert_eq!(Command::parse("undo"), Ok(Some(Command::Undo)));
        assert_eq!(Command::parse("key Enter"), Ok(Some(Command::Key(KeyEvent::plain("Enter")))));
        let Ok(Some(Command::Key(chord))) = Command::parse("key ctrl+shift+Z") else {
            panic!("expected a key command");
        };
        assert_eq!(chord.key, "Z");
        assert!(chord.modifiers.ctrl && chord.modifiers.shift && !chord.modifiers.alt);
        assert_eq!(
            Command::parse("color #ff0000"),
            Ok(Some(Command::Color(SerializableColor::new(255, 0, 0, 255))))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("fly"), Err(CommandError::Unknown("fly".into())));
        assert_eq!(Command::parse("tool laser"), Err(CommandError::Tool("laser".into())));
        assert!(matches!(Command::parse("move 1"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("move 1 2 3"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("size big"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("export"), Err(CommandError::Usage(_))));
    }
}
