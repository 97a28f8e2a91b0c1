use clap::Parser;
use rust_ws_chat::config::{ClientArgs, ClientConfig};
use rust_ws_chat::event_loop::{self, InputEvent};
use rust_ws_chat::surface::InputControl;
use rust_ws_chat::terminal::{TerminalLog, TerminalPrompt};
use rust_ws_chat::{ChatResult, ChatSession, WebSocketTransport};
use std::io;
use std::sync::mpsc;

/// Main entry point for the client application.
fn main() -> ChatResult<()> {
    env_logger::init();

    let config = ClientConfig::try_from(ClientArgs::parse())?;
    let mut prompt = TerminalPrompt::new(io::stdout());

    // No connection means no session: input stays disabled and we exit.
    let transport = match WebSocketTransport::connect(&config.endpoint, config.poll_interval) {
        Ok(transport) => transport,
        Err(e) => {
            log::error!("Failed to connect to server at {}: {}", config.endpoint, e);
            prompt.set_placeholder("Unable to reach chat server");
            return Err(e);
        }
    };

    let (input_tx, input_rx) = mpsc::channel();
    let ctrlc_tx = input_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(InputEvent::Quit);
    }) {
        log::warn!("Ctrl-C handler not installed: {}", e);
    }
    // The reader thread blocks on stdin; it is left behind when we exit.
    let _reader = event_loop::spawn_stdin_reader(input_tx);

    let mut session = ChatSession::new(
        config,
        transport,
        Some(TerminalLog::new(io::stdout())),
        Some(prompt),
    );
    event_loop::run(&mut session, &input_rx);

    println!("\rYou have disconnected from the chat.");
    Ok(())
}
