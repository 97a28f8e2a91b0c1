// src/config.rs
use crate::errors::{ChatError, ChatResult};
use crate::transcript::TimeZoneMode;
use clap::Parser;
use std::time::Duration;

const MAX_ID_LEN: usize = 20;

/// Command-line options for `chat-client`.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-client", about = "Terminal client for a websocket chat room")]
pub struct ClientArgs {
    /// Websocket URL of the chat server (plain ws:// only)
    #[arg(long, default_value = "ws://localhost:8080/chats")]
    pub endpoint: String,

    /// Name other participants see
    #[arg(long, default_value = "User")]
    pub user_id: String,

    /// Room announced on join and stamped on every message
    #[arg(long, default_value = "room1")]
    pub room_id: String,

    /// Show message times in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// How long one transport poll waits for a frame, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub poll_interval_ms: u64,
}

/// Settings for one chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user_id: String,
    pub room_id: String,
    pub time_zone: TimeZoneMode,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/chats".to_string(),
            user_id: "User".to_string(),
            room_id: "room1".to_string(),
            time_zone: TimeZoneMode::Local,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ClientConfig {
    /// Checks the endpoint scheme and the identifier lengths.
    pub fn validate(self) -> ChatResult<Self> {
        check_endpoint(&self.endpoint)?;
        validate_id("user id", &self.user_id)?;
        validate_id("room id", &self.room_id)?;
        if self.poll_interval.is_zero() {
            return Err(ChatError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Accepts plain `ws://` endpoints only; no TLS stack is linked.
pub fn check_endpoint(endpoint: &str) -> ChatResult<()> {
    if endpoint.starts_with("wss://") {
        return Err(ChatError::InvalidConfig(format!(
            "TLS endpoints are not supported, got '{}'",
            endpoint
        )));
    }
    if !endpoint.starts_with("ws://") {
        return Err(ChatError::InvalidConfig(format!(
            "endpoint must be a ws:// URL, got '{}'",
            endpoint
        )));
    }
    Ok(())
}

fn validate_id(what: &str, id: &str) -> ChatResult<()> {
    let len = id.chars().count();
    if id.trim() != id || len == 0 || len > MAX_ID_LEN {
        return Err(ChatError::InvalidConfig(format!(
            "{} must be between 1 and {} characters without surrounding whitespace, got '{}'",
            what, MAX_ID_LEN, id
        )));
    }
    Ok(())
}

impl TryFrom<ClientArgs> for ClientConfig {
    type Error = ChatError;

    fn try_from(args: ClientArgs) -> ChatResult<Self> {
        ClientConfig {
            endpoint: args.endpoint,
            user_id: args.user_id,
            room_id: args.room_id,
            time_zone: if args.utc {
                TimeZoneMode::Utc
            } else {
                TimeZoneMode::Local
            },
            poll_interval: Duration::from_millis(args.poll_interval_ms),
        }
        .validate()
    }
}

/// Command-line options for `chat-server`.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-server", about = "Local websocket relay for chat-client")]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// First port to try; the next ones are tried while it is in use
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// How long a peer's read waits before its outbound queue is drained, in milliseconds
    #[arg(long, default_value_t = 50)]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub poll_interval: Duration,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ChatResult<ClientConfig> {
        let args = ClientArgs::try_parse_from(std::iter::once("chat-client").chain(args.iter().copied()))
            .expect("arguments parse");
        ClientConfig::try_from(args)
    }

    #[test]
    fn defaults_match_the_fixed_session() {
        let config = parse(&[]).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn options_override_defaults() {
        let config = parse(&[
            "--endpoint",
            "ws://chat.example.org:9000/chats",
            "--user-id",
            "Bob",
            "--room-id",
            "lobby",
            "--utc",
        ])
        .unwrap();

        assert_eq!(config.endpoint, "ws://chat.example.org:9000/chats");
        assert_eq!(config.user_id, "Bob");
        assert_eq!(config.room_id, "lobby");
        assert_eq!(config.time_zone, TimeZoneMode::Utc);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--endpoint", "http://localhost:8080"]),
            Err(ChatError::InvalidConfig(_))
        ));
        assert!(parse(&["--user-id", ""]).is_err());
        assert!(parse(&["--room-id", "a-very-long-room-name-indeed"]).is_err());
        assert!(parse(&["--user-id", " Bob"]).is_err());
        assert!(parse(&["--poll-interval-ms", "0"]).is_err());
    }

    #[test]
    fn rejects_tls_endpoints() {
        assert!(matches!(
            parse(&["--endpoint", "wss://chat.example.org/chats"]),
            Err(ChatError::InvalidConfig(msg)) if msg.contains("TLS")
        ));
        assert!(check_endpoint("ws://localhost:8080/chats").is_ok());
    }
}
