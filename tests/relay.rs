use rust_ws_chat::relay;
use rust_ws_chat::terminal::TerminalPrompt;
use rust_ws_chat::*;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

type LiveSession = ChatSession<WebSocketTransport, Vec<TranscriptEntry>, TerminalPrompt<io::Sink>>;

fn start_relay() -> u16 {
    let listener = relay::bind(&ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        poll_interval: Duration::from_millis(10),
    })
    .expect("relay binds");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let _ = relay::serve(listener, Duration::from_millis(10));
    });
    port
}

fn connect(port: u16, user_id: &str) -> LiveSession {
    let config = ClientConfig {
        endpoint: format!("ws://127.0.0.1:{port}/chats"),
        user_id: user_id.to_string(),
        time_zone: TimeZoneMode::Utc,
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let transport = WebSocketTransport::connect(&config.endpoint, config.poll_interval)
        .expect("handshake with relay");
    let mut session = ChatSession::new(
        config,
        transport,
        Some(Vec::new()),
        Some(TerminalPrompt::new(io::sink())),
    );

    let event = session.transport_mut().poll_event();
    assert_eq!(event, Some(TransportEvent::Opened));
    session.handle(TransportEvent::Opened).unwrap();
    session
}

fn pump(session: &mut LiveSession, polls: usize) {
    for _ in 0..polls {
        if let Some(event) = session.transport_mut().poll_event() {
            let _ = session.handle(event);
        }
    }
}

fn has_text_from(session: &LiveSession, user: &str, wanted: &str) -> bool {
    session.renderer().surface().unwrap().iter().any(|entry| {
        entry.direction == Direction::Received
            && entry.body
                == EntryBody::Text {
                    user_id: user.to_string(),
                    text: wanted.to_string(),
                }
    })
}

#[test]
fn relay_forwards_messages_to_other_sessions_only() {
    let port = start_relay();
    let mut alice = connect(port, "Alice");
    let mut bob = connect(port, "Bob");

    // Registration on the relay races the handshake, so keep sending until it lands.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !has_text_from(&bob, "Alice", "hello bob") && Instant::now() < deadline {
        alice.send("hello bob").unwrap();
        pump(&mut bob, 5);
    }
    assert!(has_text_from(&bob, "Alice", "hello bob"));

    // Alice sees only her local echoes, never her own frames coming back.
    pump(&mut alice, 5);
    assert!(!has_text_from(&alice, "Alice", "hello bob"));
    assert_eq!(alice.state(), ConnectionState::Open);

    alice.close().unwrap();
    bob.close().unwrap();
    assert_eq!(bob.state(), ConnectionState::Closed);
    assert!(
        alice.transport_mut().send_text("late".to_string()).is_err(),
        "no frames after close"
    );

    // The relay answers the close frame.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut acknowledged = false;
    while !acknowledged && Instant::now() < deadline {
        acknowledged = alice.transport_mut().poll_event() == Some(TransportEvent::Closed);
    }
    assert!(acknowledged);
}

#[test]
fn tls_endpoints_are_refused_before_dialing() {
    let port = start_relay();

    let result = WebSocketTransport::connect(
        &format!("wss://127.0.0.1:{port}/chats"),
        Duration::from_millis(20),
    );
    assert!(matches!(result, Err(ChatError::InvalidConfig(_))));
}

#[test]
fn connecting_to_nothing_fails_before_a_session_exists() {
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = unused.local_addr().unwrap().port();
    drop(unused);

    let result = WebSocketTransport::connect(
        &format!("ws://127.0.0.1:{port}/chats"),
        Duration::from_millis(20),
    );
    assert!(result.is_err());
}
