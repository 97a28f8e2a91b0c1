// src/relay.rs
//! A small websocket relay: every valid frame a peer sends is forwarded to
//! all other connected peers.

use crate::config::ServerConfig;
use crate::errors::{ChatError, ChatResult};
use crate::message::ChatMessage;
use dashmap::DashMap;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tungstenite::{Message, WebSocket};

const MAX_BIND_ATTEMPTS: u16 = 10;

/// Connected peers and the queue feeding each one's socket.
pub type Peers = Arc<DashMap<SocketAddr, Sender<String>>>;

/// Binds the configured port, moving on to the next one while it is in use.
pub fn bind(config: &ServerConfig) -> ChatResult<TcpListener> {
    let mut port = config.port;
    for _ in 0..MAX_BIND_ATTEMPTS {
        match TcpListener::bind((config.host.as_str(), port)) {
            Ok(listener) => {
                log::info!("Server listening on {}", listener.local_addr()?);
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let Some(next) = port.checked_add(1) else { break };
                log::warn!("Port {} is in use, trying port {}", port, next);
                port = next;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ChatError::InvalidConfig(format!(
        "no free port found starting at {}",
        config.port
    )))
}

/// Accepts connections forever, one thread per peer.
pub fn serve(listener: TcpListener, poll_interval: Duration) -> ChatResult<()> {
    let peers: Peers = Arc::new(DashMap::new());

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peers = Arc::clone(&peers);
                thread::spawn(move || {
                    if let Err(e) = handle_client(stream, peers, poll_interval) {
                        log::error!("Error in client thread: {}", e);
                    }
                });
            }
            Err(e) => log::error!("Failed to accept connection: {}", e),
        }
    }

    Ok(())
}

/// Handles communication with a single peer until it disconnects.
pub fn handle_client(stream: TcpStream, peers: Peers, poll_interval: Duration) -> ChatResult<()> {
    let peer_addr = stream.peer_addr()?;
    log::info!("Handling client: {}", peer_addr);

    let mut socket =
        tungstenite::accept(stream).map_err(|e| ChatError::Handshake(e.to_string()))?;
    socket.get_ref().set_read_timeout(Some(poll_interval))?;

    let (outbound_tx, outbound_rx) = mpsc::channel();
    peers.insert(peer_addr, outbound_tx);

    let result = relay_frames(&mut socket, &peers, peer_addr, &outbound_rx);

    cleanup_client(&peers, peer_addr);
    log::info!("Client disconnected: {}", peer_addr);
    result
}

fn relay_frames(
    socket: &mut WebSocket<TcpStream>,
    peers: &DashMap<SocketAddr, Sender<String>>,
    peer_addr: SocketAddr,
    outbound: &Receiver<String>,
) -> ChatResult<()> {
    loop {
        while let Ok(frame) = outbound.try_recv() {
            socket.send(Message::Text(frame.into()))?;
        }

        match socket.read() {
            Ok(Message::Text(text)) => handle_frame(peers, peer_addr, &text),
            Ok(Message::Close(_)) => {
                // Sends the queued close reply.
                if let Err(e) = socket.flush() {
                    log::debug!("Close reply to {} not delivered: {}", peer_addr, e);
                }
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                return Ok(())
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Logs a valid frame and forwards it verbatim; malformed frames are dropped.
fn handle_frame(peers: &DashMap<SocketAddr, Sender<String>>, sender: SocketAddr, raw: &str) {
    match ChatMessage::decode(raw) {
        Ok(message) => {
            log::info!(
                "Received {} from '{}' ({}) at {}",
                message.message_type,
                message.user_id,
                sender,
                message.timestamp.to_rfc3339()
            );
            let delivered = broadcast_frame(peers, sender, raw);
            log::debug!("Relayed frame to {} peer(s)", delivered);
        }
        Err(e) => log::warn!("Failed to parse message from {}: {}", sender, e),
    }
}

/// Queues `frame` for every peer except the sender. Returns how many peers got it.
///
/// Peers whose queue is gone are removed from the registry.
pub fn broadcast_frame(
    peers: &DashMap<SocketAddr, Sender<String>>,
    sender: SocketAddr,
    frame: &str,
) -> usize {
    let mut delivered = 0;
    let mut failed_clients = vec![];

    for peer in peers.iter() {
        if *peer.key() == sender {
            continue;
        }
        if peer.value().send(frame.to_string()).is_ok() {
            delivered += 1;
        } else {
            failed_clients.push(*peer.key());
        }
    }

    for addr in failed_clients {
        log::warn!("Removing failed client: {}", addr);
        peers.remove(&addr);
    }
    delivered
}

fn cleanup_client(peers: &DashMap<SocketAddr, Sender<String>>, peer_addr: SocketAddr) {
    peers.remove(&peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn broadcast_skips_sender() {
        let peers = DashMap::new();
        let (alice_tx, alice_rx) = mpsc::channel();
        let (bob_tx, bob_rx) = mpsc::channel();
        peers.insert(addr(1), alice_tx);
        peers.insert(addr(2), bob_tx);

        assert_eq!(broadcast_frame(&peers, addr(1), "frame"), 1);
        assert_eq!(bob_rx.try_recv().unwrap(), "frame");
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_prunes_dead_peers() {
        let peers = DashMap::new();
        let (alice_tx, _alice_rx) = mpsc::channel();
        let (gone_tx, gone_rx) = mpsc::channel::<String>();
        drop(gone_rx);
        peers.insert(addr(1), alice_tx);
        peers.insert(addr(2), gone_tx);

        assert_eq!(broadcast_frame(&peers, addr(3), "frame"), 1);
        assert_eq!(peers.len(), 1);
        assert!(peers.contains_key(&addr(1)));
    }

    #[test]
    fn malformed_frames_are_not_relayed() {
        let peers = DashMap::new();
        let (bob_tx, bob_rx) = mpsc::channel();
        peers.insert(addr(2), bob_tx);

        handle_frame(&peers, addr(1), "{not json");
        assert!(bob_rx.try_recv().is_err());

        let valid = ChatMessage::text("Alice", "room1", "hey").encode().unwrap();
        handle_frame(&peers, addr(1), &valid);
        assert_eq!(bob_rx.try_recv().unwrap(), valid);
    }

    #[test]
    fn bind_moves_past_a_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").unwrap();
        let busy_port = busy.local_addr().unwrap().port();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: busy_port,
            poll_interval: Duration::from_millis(10),
        };

        let listener = bind(&config).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), busy_port);
    }
}
