// src/session.rs
use crate::config::ClientConfig;
use crate::errors::{ChatError, ChatResult};
use crate::message::ChatMessage;
use crate::surface::{DisplaySurface, InputControl};
use crate::transcript::{Direction, TranscriptRenderer};
use crate::transport::{Transport, TransportEvent};
use std::fmt;

const ENABLED_PLACEHOLDER: &str = "Type your message...";
const DISABLED_PLACEHOLDER: &str = "Disconnected from chat server...";

/// Lifecycle of one connection: `Connecting -> Open -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Terminal. A new session is needed to talk again.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// One connection to the chat server, bound to a single user and room.
///
/// The session owns its transport and mediates all traffic: it announces the
/// user on open, echoes sent messages locally, renders received frames and
/// toggles the input control as the connection comes and goes. Handlers are
/// expected to be called one at a time, in the order events arrive.
pub struct ChatSession<T, D, C> {
    config: ClientConfig,
    state: ConnectionState,
    transport: T,
    renderer: TranscriptRenderer<D>,
    controls: Option<C>,
}

impl<T, D, C> ChatSession<T, D, C>
where
    T: Transport,
    D: DisplaySurface,
    C: InputControl,
{
    pub fn new(config: ClientConfig, transport: T, display: Option<D>, controls: Option<C>) -> Self {
        let renderer = TranscriptRenderer::new(display, config.time_zone);
        Self {
            config,
            state: ConnectionState::Connecting,
            transport,
            renderer,
            controls,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn renderer(&self) -> &TranscriptRenderer<D> {
        &self.renderer
    }

    pub fn controls(&self) -> Option<&C> {
        self.controls.as_ref()
    }

    /// Routes one transport event to its handler.
    pub fn handle(&mut self, event: TransportEvent) -> ChatResult<()> {
        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Frame(raw) => self.on_frame(&raw).map(|_| ()),
            TransportEvent::Error(reason) => self.on_transport_error(reason),
            TransportEvent::Closed => self.on_close(),
        }
    }

    /// The transport is up: enable input and announce ourselves.
    pub fn on_open(&mut self) -> ChatResult<()> {
        if self.state != ConnectionState::Connecting {
            return Err(ChatError::InvalidTransition {
                state: self.state,
                event: "open",
            });
        }
        self.state = ConnectionState::Open;
        log::info!(
            "Joined room '{}' as '{}'",
            self.config.room_id,
            self.config.user_id
        );
        self.set_inputs_enabled(true);

        let join = ChatMessage::join(&self.config.user_id, &self.config.room_id);
        self.transport.send_text(join.encode()?)
    }

    /// Sends `text` to the room and echoes it locally.
    ///
    /// Whitespace-only input is ignored and yields `Ok(None)`.
    pub fn send(&mut self, text: &str) -> ChatResult<Option<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.state != ConnectionState::Open {
            return Err(ChatError::NotOpen(self.state));
        }

        let message = ChatMessage::text(&self.config.user_id, &self.config.room_id, text);
        self.transport.send_text(message.encode()?)?;
        log::debug!("Sent {} bytes of text", text.len());

        if let Some(controls) = self.controls.as_mut() {
            controls.clear_value();
        }
        // The frame is already on the wire; a missing surface only loses the echo.
        if let Err(e) = self.renderer.render(&message, Direction::Sent) {
            log::warn!("Local echo skipped: {}", e);
        }
        Ok(Some(message))
    }

    /// Decodes and renders one inbound frame.
    ///
    /// Malformed frames are dropped; the connection is unaffected.
    pub fn on_frame(&mut self, raw: &str) -> ChatResult<ChatMessage> {
        if self.state != ConnectionState::Open {
            return Err(ChatError::NotOpen(self.state));
        }

        let message = ChatMessage::decode(raw).map_err(|e| {
            log::warn!("Dropping malformed frame ({}): {}", e, raw);
            e
        })?;
        self.renderer.render(&message, Direction::Received)?;
        Ok(message)
    }

    /// A transport problem that did not take the connection down.
    pub fn on_transport_error(&mut self, reason: String) -> ChatResult<()> {
        log::warn!("Dropping frame: {}", reason);
        Err(ChatError::TransportFrame(reason))
    }

    /// The transport is gone. Disables input; there is no reconnect.
    pub fn on_close(&mut self) -> ChatResult<()> {
        if self.state == ConnectionState::Closed {
            log::debug!("Close reported for an already closed session");
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        log::warn!("Disconnected from chat server");
        self.set_inputs_enabled(false);
        Ok(())
    }

    /// Ends the session from our side.
    pub fn close(&mut self) -> ChatResult<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        if let Err(e) = self.transport.close() {
            log::error!("Failed to close transport cleanly: {}", e);
        }
        self.on_close()
    }

    fn set_inputs_enabled(&mut self, enabled: bool) {
        let Some(controls) = self.controls.as_mut() else {
            log::warn!(
                "{}",
                ChatError::SurfaceUnavailable(if enabled { "input (enable)" } else { "input (disable)" })
            );
            return;
        };
        controls.set_enabled(enabled);
        controls.set_placeholder(if enabled {
            ENABLED_PLACEHOLDER
        } else {
            DISABLED_PLACEHOLDER
        });
    }
}
