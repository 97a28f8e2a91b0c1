use clap::Parser;
use rust_ws_chat::config::{ServerArgs, ServerConfig};
use rust_ws_chat::relay;
use rust_ws_chat::ChatResult;

fn main() -> ChatResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(ServerArgs::parse());
    let listener = relay::bind(&config)?;

    // Accept incoming client connections
    relay::serve(listener, config.poll_interval)
}
