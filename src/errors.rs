// src/errors.rs
use crate::message::ChatMessageType;
use crate::session::ConnectionState;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("IO error occurred: {0}")]
    IoError(#[from] io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),
    /// A display surface element the session depends on is missing.
    #[error("Display surface unavailable: {0}")]
    SurfaceUnavailable(&'static str),
    #[error("Failed to decode frame: {0}")]
    FrameDecode(#[source] serde_json::Error),
    #[error("Failed to encode frame: {0}")]
    FrameEncode(#[source] serde_json::Error),
    #[error("Frame of type '{0}' carries no content.text")]
    MissingContent(ChatMessageType),
    #[error("Transport reported an unusable frame: {0}")]
    TransportFrame(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Connection is not open (state: {0})")]
    NotOpen(ConnectionState),
    #[error("Cannot handle '{event}' while {state}")]
    InvalidTransition {
        state: ConnectionState,
        event: &'static str,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A type alias for results returned by the chat client and relay.
pub type ChatResult<T> = Result<T, ChatError>;

impl ChatError {
    /// Per-frame failures that leave the connection untouched.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            ChatError::FrameDecode(_) | ChatError::MissingContent(_) | ChatError::TransportFrame(_)
        )
    }
}
