// src/transport.rs
use crate::config::check_endpoint;
use crate::errors::{ChatError, ChatResult};
use std::io;
use std::net::TcpStream;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Lifecycle and data events a transport reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and can carry frames.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// A non-fatal problem with a single frame; the connection stays up.
    Error(String),
    /// The connection is gone, for whatever reason. Terminal.
    Closed,
}

/// A bidirectional, message-oriented channel carrying serialized frames.
pub trait Transport {
    /// Writes one text frame.
    fn send_text(&mut self, frame: String) -> ChatResult<()>;

    /// Waits briefly for the next event. `None` means nothing arrived in time.
    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Starts closing the connection. Safe to call more than once.
    ///
    /// Polling afterwards yields `Closed` once the peer has answered.
    fn close(&mut self) -> ChatResult<()>;
}

/// A blocking websocket client connection.
pub struct WebSocketTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    announced_open: bool,
    /// Our close frame is out; waiting for the reply.
    closing: bool,
    closed: bool,
}

impl WebSocketTransport {
    /// Performs the websocket handshake with a plain `ws://` endpoint.
    ///
    /// Reads on the returned transport give up after `poll_interval` so the
    /// caller can interleave other work between polls.
    pub fn connect(endpoint: &str, poll_interval: Duration) -> ChatResult<Self> {
        check_endpoint(endpoint)?;
        let (mut socket, response) = tungstenite::connect(endpoint)?;
        log::info!(
            "Connected to {} (HTTP {})",
            endpoint,
            response.status().as_u16()
        );

        let MaybeTlsStream::Plain(stream) = socket.get_mut() else {
            return Err(ChatError::InvalidConfig(format!(
                "'{}' did not yield a plain TCP stream",
                endpoint
            )));
        };
        stream.set_read_timeout(Some(poll_interval))?;

        Ok(Self {
            socket,
            announced_open: false,
            closing: false,
            closed: false,
        })
    }

    fn mark_closed(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(TransportEvent::Closed)
    }
}

impl Transport for WebSocketTransport {
    fn send_text(&mut self, frame: String) -> ChatResult<()> {
        if self.closed || self.closing {
            return Err(ChatError::ConnectionClosed);
        }
        self.socket.send(Message::Text(frame.into()))?;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        // The handshake already completed inside `connect`.
        if !self.announced_open {
            self.announced_open = true;
            return Some(TransportEvent::Opened);
        }
        if self.closed {
            return None;
        }

        match self.socket.read() {
            Ok(Message::Text(text)) => Some(TransportEvent::Frame(text.to_string())),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => Some(TransportEvent::Frame(text)),
                Err(_) => Some(TransportEvent::Error(format!(
                    "binary frame of {} bytes is not UTF-8",
                    bytes.len()
                ))),
            },
            Ok(Message::Close(frame)) => {
                log::info!("Server closed the connection: {:?}", frame);
                self.mark_closed()
            }
            // Pings are answered by tungstenite on the next read or write.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => None,
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                None
            }
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                self.mark_closed()
            }
            Err(e) => {
                log::error!("Error reading from websocket: {}", e);
                self.mark_closed()
            }
        }
    }

    fn close(&mut self) -> ChatResult<()> {
        if self.closed || self.closing {
            return Ok(());
        }
        self.closing = true;
        match self.socket.close(None) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                self.closed = true;
                Ok(())
            }
            Err(e) => {
                self.closed = true;
                Err(e.into())
            }
        }
    }
}
