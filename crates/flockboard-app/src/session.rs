//! The whiteboard session.
//!
//! Owns everything one board needs and applies local effects and remote
//! changes synchronously, so the surface never lags the model.

use flockboard_core::canvas::ElementCollection;
use flockboard_core::collaboration::{RemoteChange, SyncAdapter};
use flockboard_core::config::{ConfigError, SessionConfig};
use flockboard_core::elements::{Element, SerializableColor};
use flockboard_core::input::{KeyEvent, PointerEvent};
use flockboard_core::interaction::{Effect, InteractionController};
use flockboard_core::presence::{ParticipantSet, ParticipantSource, RemoteCursors};
use flockboard_core::protocol::ClientMessage;
use flockboard_core::storage::{NamedSnapshot, SnapshotStore, StorageError};
use flockboard_core::sync::{ConnectionState, Transport, TransportError};
use flockboard_core::tools::{ToolKind, ToolSettings};
use flockboard_core::viewport::Viewport;
use flockboard_render::{History, RenderContext, Renderer, RendererError, Surface};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

/// Failures of local-only operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One collaborative board: surface, model, history, interaction and sync.
pub struct Whiteboard<S: Surface, T: Transport> {
    surface: S,
    renderer: Renderer,
    elements: ElementCollection,
    history: History,
    controller: InteractionController,
    sync: SyncAdapter<T>,
    cursors: RemoteCursors,
    participants: ParticipantSet,
    participant_source: Option<Box<dyn ParticipantSource>>,
    config: SessionConfig,
    grid: bool,
    /// Shape being dragged, drawn dashed over every redraw until release.
    preview: Option<Element>,
}

impl<S: Surface, T: Transport> Whiteboard<S, T> {
    pub fn new(surface: S, transport: T, config: &SessionConfig) -> Self {
        let mut board = Self {
            surface,
            renderer: Renderer::new(),
            elements: ElementCollection::new(),
            history: History::new(config.history_limit),
            controller: InteractionController::with_settings(ToolSettings::from(config.style)),
            sync: SyncAdapter::with_reconnect_delay(transport, config.reconnect_delay()),
            cursors: RemoteCursors::new(),
            participants: ParticipantSet::new(),
            participant_source: None,
            config: config.clone(),
            grid: config.grid,
            preview: None,
        };
        board.redraw();
        board
    }

    /// Fetch the participant list from `source` on every presence change.
    pub fn with_participant_source(mut self, source: Box<dyn ParticipantSource>) -> Self {
        self.participant_source = Some(source);
        self
    }

    // --- accessors ---

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn elements(&self) -> &ElementCollection {
        &self.elements
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn tool(&self) -> ToolKind {
        self.controller.tool()
    }

    pub fn settings(&self) -> &ToolSettings {
        self.controller.settings()
    }

    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn cursors(&self) -> &RemoteCursors {
        &self.cursors
    }

    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    pub fn sync(&self) -> &SyncAdapter<T> {
        &self.sync
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sync.state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> bool {
        self.grid
    }

    pub fn preview(&self) -> Option<&Element> {
        self.preview.as_ref()
    }

    // --- local input ---

    pub fn pointer(&mut self, event: PointerEvent) {
        let effects = self.controller.handle_pointer(event);
        self.apply(effects);
    }

    pub fn key(&mut self, event: &KeyEvent) {
        let effects = self.controller.handle_key(event);
        self.apply(effects);
    }

    pub fn confirm_text(&mut self, text: &str) {
        let effects = self.controller.confirm_text(text);
        self.apply(effects);
    }

    pub fn cancel_text(&mut self) {
        self.controller.cancel_text();
    }

    /// Switch tools. A gesture in progress is committed first.
    pub fn set_tool(&mut self, tool: ToolKind) {
        let effects = self.controller.set_tool(tool);
        self.apply(effects);
        if self.preview.take().is_some() {
            self.redraw();
        }
    }

    pub fn set_color(&mut self, color: SerializableColor) {
        self.controller.settings_mut().set_color(color);
    }

    pub fn set_size(&mut self, size: u32) {
        self.controller.settings_mut().set_size(size);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.controller.settings_mut().set_opacity(opacity);
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.grid = !self.grid;
        self.redraw();
        self.grid
    }

    pub fn zoom_in(&mut self) {
        let effects = self.controller.zoom_in();
        self.apply(effects);
    }

    pub fn zoom_out(&mut self) {
        let effects = self.controller.zoom_out();
        self.apply(effects);
    }

    pub fn reset_zoom(&mut self) {
        let effects = self.controller.reset_zoom();
        self.apply(effects);
    }

    /// Restore the previous history entry. The collection is untouched.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.surface).unwrap_or_else(|e| {
            log::error!("undo failed: {}", e);
            false
        })
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.surface).unwrap_or_else(|e| {
            log::error!("redo failed: {}", e);
            false
        })
    }

    /// Empty the board for everyone. Undoable locally.
    pub fn clear(&mut self) {
        self.history.snapshot(&self.surface);
        self.elements.clear();
        self.preview = None;
        self.redraw();
        self.sync.send(&ClientMessage::Clear);
        log::info!("board cleared");
    }

    // --- sync ---

    /// Open the room channel from the session config.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        let url = self.config.room_url()?;
        self.sync.connect(url.as_str())?;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.sync.disconnect();
    }

    /// Apply inbound frames, then fire the reconnect timer if due.
    ///
    /// Returns how many remote changes were applied.
    pub fn tick(&mut self, now: Instant) -> usize {
        let changes = self.sync.poll(now);
        let applied = changes.len();
        for change in changes {
            self.apply_remote(change);
        }
        self.sync.tick(now);
        applied
    }

    // --- collaborators ---

    /// Save the current elements under `name`.
    pub async fn save_snapshot(&self, store: &dyn SnapshotStore, name: &str) -> Result<NamedSnapshot, SessionError> {
        let snapshot = NamedSnapshot::new(name, &self.config.room, self.elements.clone())?;
        store.save(&snapshot).await?;
        log::info!("saved snapshot '{}' ({} elements)", snapshot.name, snapshot.elements.len());
        Ok(snapshot)
    }

    /// Replace the local board with a saved snapshot. Undoable, not synced.
    pub async fn load_snapshot(&mut self, store: &dyn SnapshotStore, name: &str) -> Result<(), SessionError> {
        let snapshot = store.load(name).await?;
        self.history.snapshot(&self.surface);
        let count = snapshot.elements.len();
        self.elements = snapshot.elements;
        self.redraw();
        log::info!("loaded snapshot '{}' ({} elements)", name, count);
        Ok(())
    }

    /// Write the surface, as displayed, to a PNG file.
    pub fn export_png(&self, path: &Path) -> Result<(), SessionError> {
        flockboard_render::export_png(&self.surface, path)?;
        Ok(())
    }

    // --- internals ---

    fn redraw(&mut self) {
        let ctx = RenderContext::new(&self.elements)
            .with_viewport(*self.controller.viewport())
            .with_grid(self.grid);
        match &self.preview {
            Some(preview) => self.renderer.render_preview(&mut self.surface, &ctx, preview),
            None => self.renderer.render(&mut self.surface, &ctx),
        }
        // A pen stroke is only in the collection once released.
        if let Some(stroke) = self.controller.stroke_in_progress() {
            self.renderer
                .paint_element(&mut self.surface, &stroke, self.controller.viewport());
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Snapshot => self.history.snapshot(&self.surface),
                Effect::PaintSegment { from, to, style } => {
                    self.renderer
                        .paint_segment(&mut self.surface, from, to, &style, self.controller.viewport());
                }
                Effect::Erase { center, radius } => {
                    self.renderer
                        .paint_eraser(&mut self.surface, center, radius, self.controller.viewport());
                }
                Effect::Preview(element) => {
                    self.preview = Some(element);
                    self.redraw();
                }
                Effect::Paint(element) => {
                    self.renderer
                        .paint_element(&mut self.surface, &element, self.controller.viewport());
                }
                Effect::Redraw => self.redraw(),
                Effect::Commit(element) => {
                    self.preview = None;
                    log::debug!("committed {}", element.kind().wire_name());
                    self.elements.push(element);
                }
                Effect::Send(message) => {
                    self.sync.send(&message);
                }
                Effect::Undo => {
                    self.undo();
                }
                Effect::Redo => {
                    self.redo();
                }
            }
        }
    }

    fn refresh_participants(&mut self) {
        self.participants
            .refresh(self.participant_source.as_deref_mut(), &self.config.room);
    }

    fn apply_remote(&mut self, change: RemoteChange) {
        match change {
            RemoteChange::Opened => self.refresh_participants(),
            RemoteChange::Closed => {}
            RemoteChange::ReplaceAll(elements) => {
                self.elements.replace_all(elements);
                self.redraw();
            }
            RemoteChange::Segment(segment) => {
                self.renderer.paint_segment(
                    &mut self.surface,
                    segment.from,
                    segment.to,
                    &segment.style,
                    self.controller.viewport(),
                );
            }
            RemoteChange::Append(element) => {
                if self.elements.get(element.id()).is_some() {
                    log::debug!("ignoring echo of element {}", element.id());
                    return;
                }
                self.elements.push(element);
                self.redraw();
            }
            RemoteChange::Cursor { user, position, color } => {
                self.cursors.upsert(&user, position, color.as_deref());
            }
            RemoteChange::PeerJoined(user) => {
                if let Some(user) = user {
                    log::info!("{} joined", user);
                    self.participants.join(&user);
                }
                self.refresh_participants();
            }
            RemoteChange::PeerLeft(user) => {
                if let Some(user) = user {
                    log::info!("{} left", user);
                    self.participants.leave(&user);
                    self.cursors.remove(&user);
                }
                self.refresh_participants();
            }
            RemoteChange::Cleared => {
                self.elements.clear();
                self.preview = None;
                self.redraw();
                log::info!("board cleared by a peer");
            }
        }
    }
}
