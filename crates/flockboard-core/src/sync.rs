//! WebSocket transport for the whiteboard relay.
//!
//! The session talks to the channel through the [`Transport`] trait;
//! [`NativeWebSocket`] is the `tungstenite` implementation.

use thiserror::Error;
use url::Url;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Channel opened.
    Connected,
    /// Channel closed, or a connect attempt failed.
    Disconnected,
    /// A text frame from the relay.
    Message(String),
    /// Error occurred
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid WebSocket URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("wss:// needs TLS, which this build does not include: {0}")]
    TlsUnavailable(String),
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A bidirectional, ordered text channel that may drop at any time.
pub trait Transport {
    /// Start connecting. Progress is reported through [`Transport::poll_events`].
    fn connect(&mut self, url: &str) -> Result<(), TransportError>;

    fn disconnect(&mut self);

    /// Queue a text frame.
    fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<SyncEvent>;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Check that `url` is a plain `ws://` URL. `tungstenite` is built
/// without a TLS backend, so `wss://` could never connect.
pub fn validate_ws_url(url: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "ws" => Ok(parsed),
        "wss" => Err(TransportError::TlsUnavailable(url.to_string())),
        other => Err(TransportError::UnsupportedScheme(other.to_string())),
    }
}

/// Room channel address: `{server}/ws/whiteboard/{room}/`.
pub fn room_url(server: &str, room: &str) -> Result<Url, TransportError> {
    let base = server.trim_end_matches('/');
    validate_ws_url(&format!("{base}/ws/whiteboard/{room}/"))
}

/// Track connection state from a transport event.
pub(crate) fn next_state(current: ConnectionState, event: &SyncEvent) -> ConnectionState {
    match event {
        SyncEvent::Connected => ConnectionState::Connected,
        SyncEvent::Disconnected => ConnectionState::Disconnected,
        SyncEvent::Error { .. } => ConnectionState::Error,
        SyncEvent::Message(_) => current,
    }
}

mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        events: Vec<SyncEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        fn run(url: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<SyncEvent>) {
            log::info!("WebSocket thread: connecting to {}", url);

            let (mut socket, response) = match connect(&url) {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("WebSocket connection failed: {}", e);
                    let _ = event_tx.send(SyncEvent::Error {
                        message: format!("Connection failed: {}", e),
                    });
                    // A failed connect is a close as far as recovery goes.
                    let _ = event_tx.send(SyncEvent::Disconnected);
                    return;
                }
            };

            log::info!("WebSocket connected, status: {}", response.status());
            let _ = event_tx.send(SyncEvent::Connected);

            // Short read timeout so outgoing commands are not starved.
            match socket.get_mut() {
                tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                    let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                    let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                }
                #[allow(unreachable_patterns)]
                _ => {
                    log::debug!("TLS or other stream - using default timeout handling");
                }
            }

            'session: loop {
                loop {
                    match cmd_rx.try_recv() {
                        Ok(WsCommand::Send(msg)) => {
                            log::debug!("WebSocket sending: {}", preview(&msg));
                            if let Err(e) = socket.send(Message::Text(msg)) {
                                log::error!("WebSocket send error: {}", e);
                                let _ = event_tx.send(SyncEvent::Error {
                                    message: format!("Send failed: {}", e),
                                });
                                break 'session;
                            }
                        }
                        Ok(WsCommand::Close) => {
                            log::info!("WebSocket close requested");
                            let _ = socket.close(None);
                            break 'session;
                        }
                        Err(TryRecvError::Disconnected) => {
                            log::info!("WebSocket command channel disconnected");
                            break 'session;
                        }
                        Err(TryRecvError::Empty) => break,
                    }
                }

                match socket.read() {
                    Ok(Message::Text(txt)) => {
                        log::debug!("WebSocket received: {}", preview(&txt));
                        if event_tx.send(SyncEvent::Message(txt)).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = socket.send(Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => {
                        log::info!("WebSocket received close frame");
                        break;
                    }
                    Ok(_) => {} // Ignore binary, pong
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        log::error!("WebSocket read error: {}", e);
                        let _ = event_tx.send(SyncEvent::Error {
                            message: format!("Read failed: {}", e),
                        });
                        break;
                    }
                }
            }

            log::info!("WebSocket thread exiting");
            let _ = event_tx.send(SyncEvent::Disconnected);
        }
    }

    impl Transport for NativeWebSocket {
        fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
                return Err(TransportError::AlreadyConnected);
            }
            validate_ws_url(url)?;

            // Drop whatever is left of a previous, finished session.
            self.cmd_tx = None;
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();
            let url = url.to_string();
            let handle = thread::spawn(move || Self::run(url, cmd_rx, event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        /// Disconnect from the server.
        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, text: &str) -> Result<(), TransportError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(text.to_string()))
                    .map_err(|e| TransportError::SendFailed(e.to_string())),
                None => Err(TransportError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    self.state = next_state(self.state, &event);
                    self.events.push(event);
                }
            }
            std::mem::take(&mut self.events)
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    fn preview(text: &str) -> &str {
        let end = text
            .char_indices()
            .nth(100)
            .map_or(text.len(), |(i, _)| i);
        &text[..end]
    }
}

pub use native_client::NativeWebSocket;

mod memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard};

    #[derive(Debug, Default)]
    struct Shared {
        inbound: VecDeque<SyncEvent>,
        sent: Vec<String>,
        connect_urls: Vec<String>,
        refuse: bool,
    }

    fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
        shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// In-process transport; the paired [`MemoryRemote`] plays the relay.
    #[derive(Debug)]
    pub struct MemoryTransport {
        shared: Arc<Mutex<Shared>>,
        state: ConnectionState,
    }

    /// The relay side of a [`MemoryTransport`].
    #[derive(Debug, Clone)]
    pub struct MemoryRemote {
        shared: Arc<Mutex<Shared>>,
    }

    impl MemoryTransport {
        pub fn pair() -> (Self, MemoryRemote) {
            let shared = Arc::new(Mutex::new(Shared::default()));
            let transport = Self {
                shared: Arc::clone(&shared),
                state: ConnectionState::Disconnected,
            };
            (transport, MemoryRemote { shared })
        }
    }

    impl Transport for MemoryTransport {
        fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
                return Err(TransportError::AlreadyConnected);
            }
            validate_ws_url(url)?;
            self.state = ConnectionState::Connecting;
            let mut shared = lock(&self.shared);
            shared.connect_urls.push(url.to_string());
            if shared.refuse {
                shared.inbound.push_back(SyncEvent::Error {
                    message: "Connection failed: refused".to_string(),
                });
                shared.inbound.push_back(SyncEvent::Disconnected);
            } else {
                shared.inbound.push_back(SyncEvent::Connected);
            }
            Ok(())
        }

        fn disconnect(&mut self) {
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, text: &str) -> Result<(), TransportError> {
            if self.state != ConnectionState::Connected {
                return Err(TransportError::NotConnected);
            }
            lock(&self.shared).sent.push(text.to_string());
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            let events: Vec<SyncEvent> = lock(&self.shared).inbound.drain(..).collect();
            for event in &events {
                self.state = next_state(self.state, event);
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl MemoryRemote {
        /// Deliver a text frame to the client.
        pub fn push_text(&self, text: impl Into<String>) {
            lock(&self.shared).inbound.push_back(SyncEvent::Message(text.into()));
        }

        /// Drop the connection from the relay side.
        pub fn close(&self) {
            lock(&self.shared).inbound.push_back(SyncEvent::Disconnected);
        }

        /// Make future connect attempts fail.
        pub fn refuse_connections(&self, refuse: bool) {
            lock(&self.shared).refuse = refuse;
        }

        /// Frames the client has sent, oldest first.
        pub fn sent(&self) -> Vec<String> {
            lock(&self.shared).sent.clone()
        }

        pub fn take_sent(&self) -> Vec<String> {
            std::mem::take(&mut lock(&self.shared).sent)
        }

        /// URLs of every connect attempt so far.
        pub fn connect_urls(&self) -> Vec<String> {
            lock(&self.shared).connect_urls.clone()
        }
    }
}

pub use memory::{MemoryRemote, MemoryTransport};
