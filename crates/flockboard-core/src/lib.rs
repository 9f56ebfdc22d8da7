//! Flockboard Core Library
//!
//! Platform-agnostic data structures, interaction and sync logic for the
//! Flockboard collaborative whiteboard.

pub mod canvas;
pub mod collaboration;
pub mod config;
pub mod elements;
pub mod input;
pub mod interaction;
pub mod presence;
pub mod protocol;
pub mod storage;
pub mod sync;
pub mod tools;
pub mod viewport;

pub use canvas::ElementCollection;
pub use collaboration::{RECONNECT_DELAY, RemoteChange, SyncAdapter};
pub use config::{ConfigError, SessionConfig};
pub use elements::{Element, ElementId, ElementKind, ElementStyle, SerializableColor};
pub use input::{KeyEvent, Modifiers, PointerEvent};
pub use interaction::{Effect, InteractionController, InteractionState, TextEntry};
pub use presence::{ParticipantSet, ParticipantSource, RemoteCursors};
pub use protocol::{ClientMessage, ElementDescriptor, ProtocolError, ServerMessage};
pub use sync::{ConnectionState, MemoryTransport, NativeWebSocket, SyncEvent, Transport, TransportError};
pub use tools::{ToolKind, ToolSettings};
pub use viewport::Viewport;
