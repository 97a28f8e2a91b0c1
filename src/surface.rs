// src/surface.rs
//! Capabilities the session writes to but does not own.

use crate::transcript::TranscriptEntry;

/// An append-only, ordered log of rendered entries.
pub trait DisplaySurface {
    /// Appends one entry at the end of the log.
    fn append_entry(&mut self, entry: &TranscriptEntry);

    /// Brings the newest entry into view.
    fn scroll_to_latest(&mut self);
}

/// The user's input affordance: a text field plus its submit trigger.
pub trait InputControl {
    fn set_enabled(&mut self, enabled: bool);

    fn set_placeholder(&mut self, placeholder: &str);

    /// Empties the current text value after a successful submit.
    fn clear_value(&mut self);
}

/// An in-memory log, handy for headless sessions.
impl DisplaySurface for Vec<TranscriptEntry> {
    fn append_entry(&mut self, entry: &TranscriptEntry) {
        self.push(entry.clone());
    }

    fn scroll_to_latest(&mut self) {}
}
