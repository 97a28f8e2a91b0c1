// src/message.rs
use crate::errors::{ChatError, ChatResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The "high-level" type of a chat frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")] // so we get JSON like "message", "join"
pub enum ChatMessageType {
    /// Announces presence in a room. Carries no content.
    Join,
    /// Carries user-authored text.
    #[default]
    Message,
}

impl fmt::Display for ChatMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMessageType::Join => write!(f, "join"),
            ChatMessageType::Message => write!(f, "message"),
        }
    }
}

/// Structured payload of a `message` frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    pub text: String,
}

/// One frame exchanged with the chat server.
///
/// Values are immutable once built: the session constructs them at send time
/// or when a frame is decoded, hands them to the transport and the renderer,
/// and drops them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Missing on an incoming frame means `message`.
    #[serde(rename = "type", default)]
    pub message_type: ChatMessageType,

    pub user_id: String,

    /// Always sent; optional on incoming frames.
    #[serde(default)]
    pub room_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Builds a presence announcement stamped with the current time.
    pub fn join(user_id: &str, room_id: &str) -> Self {
        Self {
            message_type: ChatMessageType::Join,
            user_id: user_id.to_string(),
            room_id: room_id.to_string(),
            content: None,
            timestamp: Utc::now(),
        }
    }

    /// Builds a text message stamped with the current time.
    pub fn text(user_id: &str, room_id: &str, text: &str) -> Self {
        Self {
            message_type: ChatMessageType::Message,
            user_id: user_id.to_string(),
            room_id: room_id.to_string(),
            content: Some(MessageContent {
                text: text.to_string(),
            }),
            timestamp: Utc::now(),
        }
    }

    /// `content.text`, if the frame has any.
    pub fn body(&self) -> Option<&str> {
        self.content.as_ref().map(|content| content.text.as_str())
    }

    /// Serializes the message into a single JSON text frame.
    pub fn encode(&self) -> ChatResult<String> {
        serde_json::to_string(self).map_err(ChatError::FrameEncode)
    }

    /// Parses a raw text frame.
    ///
    /// A `message` frame must carry `content.text`; a `join` frame may omit
    /// `content` entirely.
    pub fn decode(raw: &str) -> ChatResult<Self> {
        let message: ChatMessage = serde_json::from_str(raw).map_err(ChatError::FrameDecode)?;
        if message.message_type == ChatMessageType::Message && message.body().is_none() {
            return Err(ChatError::MissingContent(message.message_type));
        }
        Ok(message)
    }
}
