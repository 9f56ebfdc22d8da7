//! Flockboard Application
//!
//! The whiteboard session that wires interaction, rendering, history and
//! sync together, plus the line commands of the headless client.

mod commands;
mod session;

pub use commands::{Command, CommandError, HELP, PointerPhase, print_help};
pub use session::{SessionError, Whiteboard};
