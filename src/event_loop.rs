// src/event_loop.rs
//! Single-dispatcher event loop: transport events and user input are handled
//! one at a time, each to completion, in the order they are taken.

use crate::errors::ChatError;
use crate::session::{ChatSession, ConnectionState};
use crate::surface::{DisplaySurface, InputControl};
use crate::transport::{Transport, TransportEvent};
use std::io::{self, BufRead};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// Upper bound on polls spent waiting for the peer's close reply.
const CLOSE_REPLY_POLLS: usize = 20;

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A submitted line of text.
    Submit(String),
    /// Leave the room and end the session.
    Quit,
}

impl InputEvent {
    /// Maps a typed line to an event; `/quit` ends the session.
    pub fn from_line(line: &str) -> Self {
        match line.trim() {
            "/quit" => InputEvent::Quit,
            _ => InputEvent::Submit(line.to_string()),
        }
    }
}

/// Reads stdin line by line on a background thread and queues each line.
///
/// End of input is queued as `Quit`.
pub fn spawn_stdin_reader(events: Sender<InputEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let event = match line {
                Ok(line) => InputEvent::from_line(&line),
                Err(e) => {
                    log::error!("Error reading input: {}", e);
                    break;
                }
            };
            let quit = event == InputEvent::Quit;
            if events.send(event).is_err() || quit {
                return;
            }
        }
        let _ = events.send(InputEvent::Quit);
    })
}

/// Drives `session` until it is closed.
///
/// Each turn polls the transport once, then takes at most one queued input
/// event. Handler failures are logged and never end the loop; only the
/// session reaching `Closed` does. A dropped input queue counts as `Quit`.
pub fn run<T, D, C>(session: &mut ChatSession<T, D, C>, input: &Receiver<InputEvent>)
where
    T: Transport,
    D: DisplaySurface,
    C: InputControl,
{
    while session.state() != ConnectionState::Closed {
        if let Some(event) = session.transport_mut().poll_event() {
            log::debug!("Transport event: {:?}", event);
            if let Err(e) = session.handle(event) {
                report(&e);
            }
        }

        match input.try_recv() {
            Ok(InputEvent::Submit(text)) => {
                if let Err(e) = session.send(&text) {
                    report(&e);
                }
            }
            Ok(InputEvent::Quit) | Err(TryRecvError::Disconnected) => {
                log::info!("Leaving room '{}'", session.config().room_id);
                if let Err(e) = session.close() {
                    report(&e);
                }
            }
            Err(TryRecvError::Empty) => {}
        }
    }

    await_close_reply(session.transport_mut());
}

/// Reads until the peer acknowledges our close, or gives up after a few polls.
///
/// Frames still in flight are discarded; the session no longer renders.
fn await_close_reply<T: Transport>(transport: &mut T) {
    for _ in 0..CLOSE_REPLY_POLLS {
        match transport.poll_event() {
            Some(TransportEvent::Closed) => {
                log::debug!("Closing handshake complete");
                return;
            }
            Some(event) => log::debug!("Discarding {:?} after close", event),
            None => {}
        }
    }
    log::debug!("No close reply after {} polls", CLOSE_REPLY_POLLS);
}

fn report(error: &ChatError) {
    match error {
        // Already logged where the frame was dropped.
        e if e.is_frame_error() => log::debug!("Frame dropped: {}", e),
        ChatError::NotOpen(_) => log::warn!("Ignoring input: {}", error),
        _ => log::error!("{}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_command_is_recognized_with_padding() {
        assert_eq!(InputEvent::from_line("  /quit "), InputEvent::Quit);
        assert_eq!(
            InputEvent::from_line("/quitter"),
            InputEvent::Submit("/quitter".to_string())
        );
        assert_eq!(
            InputEvent::from_line(" hi "),
            InputEvent::Submit(" hi ".to_string())
        );
    }
}
