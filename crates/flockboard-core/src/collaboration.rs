//! Sync protocol adapter: the bridge between the local board and the relay.
//!
//! Outbound, board activity becomes [`ClientMessage`] frames, sent only
//! while the channel is open. Inbound, frames decode into
//! [`RemoteChange`]s for the session to apply. A closed channel is retried
//! on a fixed delay driven by [`SyncAdapter::tick`].

use crate::elements::Element;
use crate::protocol::{ClientMessage, Segment, ServerMessage};
use crate::sync::{ConnectionState, SyncEvent, Transport, TransportError};
use kurbo::Point;
use std::time::{Duration, Instant};

/// Delay between a close and the reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Something the relay told us, decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteChange {
    /// The channel opened; refresh participants.
    Opened,
    /// The channel closed; a reconnect is scheduled.
    Closed,
    /// Replace the whole collection.
    ReplaceAll(Vec<Element>),
    /// Paint a peer's segment without creating an element.
    Segment(Segment),
    /// Append a peer's element.
    Append(Element),
    Cursor {
        user: String,
        position: Point,
        color: Option<String>,
    },
    PeerJoined(Option<String>),
    PeerLeft(Option<String>),
    /// Empty the collection and the surface.
    Cleared,
}

/// Outgoing frames and connection lifecycle over a [`Transport`].
pub struct SyncAdapter<T: Transport> {
    transport: T,
    /// Room URL, once `connect` has been called.
    url: Option<String>,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    /// Frames dropped because the channel was not open.
    dropped: usize,
}

impl<T: Transport> SyncAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self::with_reconnect_delay(transport, RECONNECT_DELAY)
    }

    pub fn with_reconnect_delay(transport: T, reconnect_delay: Duration) -> Self {
        Self {
            transport,
            url: None,
            reconnect_delay,
            reconnect_at: None,
            dropped: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// When the pending reconnect will fire, if one is scheduled.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Open the room channel. The URL is kept for reconnects.
    pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        self.url = Some(url.to_string());
        self.reconnect_at = None;
        log::info!("connecting to {}", url);
        self.transport.connect(url)
    }

    /// Send a frame if the channel is open; otherwise drop it.
    ///
    /// Returns whether the frame went out.
    pub fn send(&mut self, message: &ClientMessage) -> bool {
        if !self.transport.is_connected() {
            self.dropped += 1;
            log::debug!("dropping {} frame: not connected", message.kind());
            return false;
        }
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to encode {} frame: {}", message.kind(), e);
                return false;
            }
        };
        match self.transport.send(&text) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to send {} frame: {}", message.kind(), e);
                false
            }
        }
    }

    /// Drain transport events and decode them, in arrival order.
    pub fn poll(&mut self, now: Instant) -> Vec<RemoteChange> {
        let mut changes = Vec::new();
        for event in self.transport.poll_events() {
            match event {
                SyncEvent::Connected => {
                    log::info!("connected");
                    self.reconnect_at = None;
                    changes.push(RemoteChange::Opened);
                }
                SyncEvent::Disconnected => {
                    if self.url.is_some() {
                        let at = now + self.reconnect_delay;
                        log::warn!("connection closed, reconnecting in {:?}", self.reconnect_delay);
                        self.reconnect_at = Some(at);
                    }
                    changes.push(RemoteChange::Closed);
                }
                SyncEvent::Error { message } => {
                    log::error!("transport error: {}", message);
                }
                SyncEvent::Message(text) => changes.extend(decode_frame(&text)),
            }
        }
        changes
    }

    /// Fire the reconnect timer if it is due.
    ///
    /// The reconnect only happens if the channel is still closed. Returns
    /// whether a connect attempt was made.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(at) = self.reconnect_at else {
            return false;
        };
        if now < at {
            return false;
        }
        self.reconnect_at = None;
        if !matches!(
            self.transport.state(),
            ConnectionState::Disconnected | ConnectionState::Error
        ) {
            return false;
        }
        let Some(url) = self.url.clone() else {
            return false;
        };
        log::info!("reconnecting to {}", url);
        match self.transport.connect(&url) {
            Ok(()) => true,
            Err(e) => {
                log::error!("reconnect failed: {}", e);
                false
            }
        }
    }

    /// Close the channel for good; no reconnect follows.
    pub fn disconnect(&mut self) {
        self.url = None;
        self.reconnect_at = None;
        self.transport.disconnect();
    }
}

/// Decode one inbound frame. Malformed frames decode to nothing.
pub fn decode_frame(text: &str) -> Option<RemoteChange> {
    let message = match ServerMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("skipping inbound frame: {}", e);
            return None;
        }
    };
    match message {
        ServerMessage::InitialState { elements } => {
            let total = elements.len();
            let decoded: Vec<Element> = elements
                .iter()
                .filter_map(|descriptor| match descriptor.to_element() {
                    Ok(element) => Some(element),
                    Err(e) => {
                        log::warn!("skipping element in initial state: {}", e);
                        None
                    }
                })
                .collect();
            log::info!("initial state: {} of {} elements", decoded.len(), total);
            Some(RemoteChange::ReplaceAll(decoded))
        }
        ServerMessage::DrawUpdate(update) => match update.segment() {
            Ok(segment) => Some(RemoteChange::Segment(segment)),
            Err(e) => {
                log::warn!("skipping draw_update: {}", e);
                None
            }
        },
        ServerMessage::ElementAdded(descriptor) => match descriptor.to_element() {
            Ok(element) => Some(RemoteChange::Append(element)),
            Err(e) => {
                log::warn!("skipping element_added: {}", e);
                None
            }
        },
        ServerMessage::CursorUpdate { user, x, y, color } => Some(RemoteChange::Cursor {
            user,
            position: Point::new(x, y),
            color,
        }),
        ServerMessage::UserJoined { user } => Some(RemoteChange::PeerJoined(user)),
        ServerMessage::UserLeft { user } => Some(RemoteChange::PeerLeft(user)),
        ServerMessage::WhiteboardCleared => Some(RemoteChange::Cleared),
        ServerMessage::Error { message } => {
            log::warn!("relay reported an error: {}", message);
            None
        }
        ServerMessage::Unknown => {
            log::debug!("ignoring unhandled frame type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementKind;
    use crate::sync::{MemoryRemote, MemoryTransport};

    const URL: &str = "ws://relay.test/ws/whiteboard/room/";

    fn connected() -> (SyncAdapter<MemoryTransport>, MemoryRemote, Instant) {
        let (transport, remote) = MemoryTransport::pair();
        let mut adapter = SyncAdapter::new(transport);
        adapter.connect(URL).unwrap();
        let now = Instant::now();
        assert_eq!(adapter.poll(now), vec![RemoteChange::Opened]);
        (adapter, remote, now)
    }

    #[test]
    fn test_frames_dropped_while_closed() {
        let (transport, remote) = MemoryTransport::pair();
        let mut adapter = SyncAdapter::new(transport);
        assert!(!adapter.send(&ClientMessage::Clear));
        adapter.connect(URL).unwrap();
        // Still connecting until the open event is polled.
        assert!(!adapter.send(&ClientMessage::Clear));
        assert_eq!(adapter.dropped(), 2);
        adapter.poll(Instant::now());
        assert!(adapter.send(&ClientMessage::Clear));
        assert_eq!(remote.sent(), vec![r#"{"type":"clear"}"#.to_string()]);
    }

    #[test]
    fn test_outbound_order_is_kept() {
        let (mut adapter, remote, _) = connected();
        adapter.send(&ClientMessage::cursor_move(Point::new(1.0, 1.0)));
        adapter.send(&ClientMessage::Clear);
        adapter.send(&ClientMessage::cursor_move(Point::new(2.0, 2.0)));
        let kinds: Vec<String> = remote
            .sent()
            .iter()
            .map(|frame| serde_json::from_str::<serde_json::Value>(frame).unwrap()["type"].to_string())
            .collect();
        assert_eq!(kinds, vec!["\"cursor_move\"", "\"clear\"", "\"cursor_move\""]);
    }

    #[test]
    fn test_inbound_frames_decode_in_order() {
        let (mut adapter, remote, now) = connected();
        remote.push_text(r#"{"type":"user_joined","user":"amy"}"#);
        remote.push_text("garbage");
        remote.push_text(r##"{"type":"element_added","element_type":"line","x":0,"y":0,"width":10,"height":0,"color":"#000000"}"##);
        remote.push_text(r#"{"type":"cursor_update","user":"amy","x":4,"y":5}"#);
        remote.push_text(r#"{"type":"whiteboard_cleared"}"#);
        let changes = adapter.poll(now);
        assert_eq!(changes.len(), 4);
        assert_eq!(changes[0], RemoteChange::PeerJoined(Some("amy".to_string())));
        assert!(matches!(&changes[1], RemoteChange::Append(e) if e.kind() == ElementKind::Line));
        assert_eq!(
            changes[2],
            RemoteChange::Cursor {
                user: "amy".to_string(),
                position: Point::new(4.0, 5.0),
                color: None
            }
        );
        assert_eq!(changes[3], RemoteChange::Cleared);
    }

    #[test]
    fn test_initial_state_skips_bad_elements() {
        let frame = r##"{"type":"initial_state","elements":[
            {"type":"rectangle","x":1,"y":2,"width":3,"height":4,"color":"#112233","stroke_width":2},
            {"type":"blob","x":0,"y":0},
            {"type":"text","x":5,"y":5,"text_content":"hi","font_size":12,"color":"#000000"}
        ]}"##;
        let Some(RemoteChange::ReplaceAll(elements)) = decode_frame(frame) else {
            panic!("expected ReplaceAll");
        };
        let kinds: Vec<_> = elements.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ElementKind::Rectangle, ElementKind::Text]);
    }

    #[test]
    fn test_reconnect_after_fixed_delay() {
        let (mut adapter, remote, now) = connected();
        remote.close();
        assert_eq!(adapter.poll(now), vec![RemoteChange::Closed]);
        assert_eq!(adapter.reconnect_at(), Some(now + RECONNECT_DELAY));

        assert!(!adapter.tick(now + Duration::from_millis(2999)));
        assert_eq!(remote.connect_urls().len(), 1);
        assert!(adapter.tick(now + RECONNECT_DELAY));
        assert_eq!(remote.connect_urls(), vec![URL.to_string(), URL.to_string()]);
        assert_eq!(adapter.poll(now + RECONNECT_DELAY), vec![RemoteChange::Opened]);
        assert!(adapter.reconnect_at().is_none());
    }

    #[test]
    fn test_reconnect_skipped_when_already_open() {
        let (mut adapter, remote, now) = connected();
        remote.close();
        adapter.poll(now);
        // Something else started reopening the channel before the timer fired.
        adapter.transport_mut().connect(URL).unwrap();
        assert_eq!(adapter.state(), ConnectionState::Connecting);
        assert!(!adapter.tick(now + RECONNECT_DELAY));
        assert!(adapter.reconnect_at().is_none());
        assert_eq!(remote.connect_urls().len(), 2);
    }

    #[test]
    fn test_unreachable_relay_keeps_retrying() {
        let (transport, remote) = MemoryTransport::pair();
        remote.refuse_connections(true);
        let mut adapter = SyncAdapter::new(transport);
        adapter.connect(URL).unwrap();
        let mut now = Instant::now();
        for attempt in 1..=3 {
            assert_eq!(adapter.poll(now), vec![RemoteChange::Closed]);
            assert_eq!(remote.connect_urls().len(), attempt);
            now += RECONNECT_DELAY;
            assert!(adapter.tick(now));
        }
    }

    #[test]
    fn test_disconnect_cancels_reconnect() {
        let (mut adapter, remote, now) = connected();
        remote.close();
        adapter.poll(now);
        adapter.disconnect();
        assert!(!adapter.tick(now + RECONNECT_DELAY));
        assert_eq!(remote.connect_urls().len(), 1);
    }
}
