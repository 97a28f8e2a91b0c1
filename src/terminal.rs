// src/terminal.rs
//! Line-oriented terminal rendering of the transcript and the input prompt.

use crate::surface::{DisplaySurface, InputControl};
use crate::transcript::{Direction, EntryBody, TranscriptEntry};
use std::borrow::Cow;
use std::io::Write;

const PROMPT: &str = "[You]: ";
// `\r` goes to column 0, `ESC[2K` clears the whole line.
const CLEAR_LINE: &str = "\r\x1B[2K";
// Cursor up one line, then clear it.
const ERASE_PREVIOUS_LINE: &str = "\x1B[1A\r\x1B[2K";

/// Escapes control and invisible formatting characters in untrusted text.
///
/// Remote users must not be able to move the cursor, recolor the terminal,
/// overwrite earlier lines or reorder what is shown. ESC, CR, LF, every other
/// control character and the bidi overrides are printed in their escaped
/// form (`\u{1b}`, `\r`, `\u{202e}`).
pub fn escape_control(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if needs_escape(c) {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

fn needs_escape(c: char) -> bool {
    c.is_control() || is_invisible_format(c)
}

/// Zero-width and direction-changing format characters.
fn is_invisible_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

/// Formats one entry as a single terminal line, without a trailing newline.
pub fn format_entry(entry: &TranscriptEntry) -> String {
    match &entry.body {
        EntryBody::Text { user_id, text } => {
            let marker = match entry.direction {
                Direction::Sent => '>',
                Direction::Received => '<',
            };
            format!(
                "{} {} [{}]: {}",
                entry.time_label,
                marker,
                escape_control(user_id),
                escape_control(text)
            )
        }
        EntryBody::Notice(notice) => format!("{} * {}", entry.time_label, escape_control(notice)),
    }
}

/// The transcript, printed line by line; the terminal does the scrolling.
#[derive(Debug)]
pub struct TerminalLog<W: Write> {
    out: W,
}

impl<W: Write> TerminalLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySurface for TerminalLog<W> {
    fn append_entry(&mut self, entry: &TranscriptEntry) {
        if let Err(e) = writeln!(self.out, "{}{}", CLEAR_LINE, format_entry(entry)) {
            log::error!("Failed to write transcript entry: {}", e);
        }
    }

    fn scroll_to_latest(&mut self) {
        // Put the prompt back under the newest line.
        if let Err(e) = write!(self.out, "{}", PROMPT).and_then(|_| self.out.flush()) {
            log::error!("Failed to flush stdout: {}", e);
        }
    }
}

/// The input line. Text itself is read by the stdin reader thread.
#[derive(Debug)]
pub struct TerminalPrompt<W: Write> {
    out: W,
    enabled: bool,
}

impl<W: Write> TerminalPrompt<W> {
    /// Starts disabled until the connection opens.
    pub fn new(out: W) -> Self {
        Self {
            out,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = write!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            log::error!("Failed to write prompt: {}", e);
        }
    }
}

impl<W: Write> InputControl for TerminalPrompt<W> {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        let mut text = format!("{}({})\n", CLEAR_LINE, placeholder);
        if self.enabled {
            text.push_str(PROMPT);
        }
        self.emit(&text);
    }

    fn clear_value(&mut self) {
        // The submitted line is still echoed above the cursor.
        self.emit(ERASE_PREVIOUS_LINE);
    }
}
