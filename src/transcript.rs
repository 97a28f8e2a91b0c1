// src/transcript.rs
use crate::errors::{ChatError, ChatResult};
use crate::message::{ChatMessage, ChatMessageType};
use crate::surface::DisplaySurface;
use chrono::{DateTime, Local, Utc};
use std::fmt;

/// Presentational tag for an entry. Carries no protocol meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => write!(f, "sent"),
            Direction::Received => write!(f, "received"),
        }
    }
}

/// Which clock the time-of-day labels are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneMode {
    #[default]
    Local,
    Utc,
}

impl TimeZoneMode {
    /// Hour and minute of `timestamp`, e.g. `"09:05"`.
    pub fn time_label(&self, timestamp: &DateTime<Utc>) -> String {
        match self {
            TimeZoneMode::Local => timestamp.with_timezone(&Local).format("%H:%M").to_string(),
            TimeZoneMode::Utc => timestamp.format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    /// A user's message.
    Text { user_id: String, text: String },
    /// A system-style line such as a presence announcement.
    Notice(String),
}

impl EntryBody {
    fn from_message(message: &ChatMessage) -> Self {
        match message.message_type {
            ChatMessageType::Join => {
                EntryBody::Notice(format!("{} joined the room", message.user_id))
            }
            ChatMessageType::Message => EntryBody::Text {
                user_id: message.user_id.clone(),
                text: message.body().unwrap_or_default().to_string(),
            },
        }
    }
}

/// One line of the transcript, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Position in the log; strictly increasing.
    pub index: usize,
    pub time_label: String,
    pub direction: Direction,
    pub body: EntryBody,
}

/// Turns messages into entries and appends them to a display surface.
#[derive(Debug)]
pub struct TranscriptRenderer<D> {
    surface: Option<D>,
    zone: TimeZoneMode,
    len: usize,
}

impl<D: DisplaySurface> TranscriptRenderer<D> {
    pub fn new(surface: Option<D>, zone: TimeZoneMode) -> Self {
        Self {
            surface,
            zone,
            len: 0,
        }
    }

    /// Appends `message` to the log and scrolls to it, returning its index.
    ///
    /// Without a surface nothing is drawn and `SurfaceUnavailable` comes back.
    pub fn render(&mut self, message: &ChatMessage, direction: Direction) -> ChatResult<usize> {
        let Some(surface) = self.surface.as_mut() else {
            log::warn!(
                "No transcript surface; dropping {} {} entry from '{}'",
                direction,
                message.message_type,
                message.user_id
            );
            return Err(ChatError::SurfaceUnavailable("transcript"));
        };

        let entry = TranscriptEntry {
            index: self.len,
            time_label: self.zone.time_label(&message.timestamp),
            direction,
            body: EntryBody::from_message(message),
        };
        surface.append_entry(&entry);
        surface.scroll_to_latest();
        self.len += 1;

        log::debug!("Rendered {} entry #{}", direction, entry.index);
        Ok(entry.index)
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn surface(&self) -> Option<&D> {
        self.surface.as_ref()
    }
}
