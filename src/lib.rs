//! Terminal websocket chat client, plus a small relay server to talk to.
//!
//! The [`session::ChatSession`] owns one connection and mediates all traffic;
//! the [`transcript::TranscriptRenderer`] turns messages into log entries.
//! Display surfaces, input controls and transports are traits.

pub mod config;
pub mod errors;
pub mod event_loop;
pub mod message;
pub mod relay;
pub mod session;
pub mod surface;
pub mod terminal;
pub mod transcript;
pub mod transport;

pub use config::{ClientConfig, ServerConfig};
pub use errors::{ChatError, ChatResult};
pub use message::{ChatMessage, ChatMessageType, MessageContent};
pub use session::{ChatSession, ConnectionState};
pub use transcript::{Direction, EntryBody, TimeZoneMode, TranscriptEntry, TranscriptRenderer};
pub use transport::{Transport, TransportEvent, WebSocketTransport};
