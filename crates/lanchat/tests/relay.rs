//! Integration tests for the relay: real listener, real sockets.
//!
//! Each test starts a server on a random port and drives it with plain
//! `TcpStream` clients that speak the JSON wire format directly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lanchat::prelude::*;
use lanchat_protocol::{input, Codec, JsonCodec, ACK_OK, ACK_REJECTED, SIGN_OFF};
use lanchat_session::SessionRegistry;
use lanchat_transport::TcpConnection;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Harness
// =========================================================================

struct Running {
    addr: SocketAddr,
    stop: CancellationToken,
    registry: Arc<SessionRegistry<TcpConnection>>,
    handle: JoinHandle<Result<(), LanChatError>>,
}

async fn start(config: RelayConfig) -> Running {
    let server = RelayServer::builder()
        .bind("127.0.0.1:0")
        .server_name("Server-test")
        .config(config)
        .build()
        .await
        .expect("should bind");
    let addr = server.local_addr();
    let stop = server.shutdown_token();
    let registry = server.registry();
    let handle = tokio::spawn(server.run());
    Running {
        addr,
        stop,
        registry,
        handle,
    }
}

async fn start_default() -> Running {
    start(RelayConfig::default()).await
}

/// Waits until `check` holds for the registry, or fails the test.
async fn eventually<F>(registry: &SessionRegistry<TcpConnection>, what: &str, check: F)
where
    F: Fn(&[String]) -> bool,
{
    for _ in 0..100 {
        if check(&registry.snapshot().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for: {what}");
}

/// A raw chat client.
struct Client {
    peer: Peer,
    stream: TcpStream,
    pending: Vec<u8>,
}

impl Client {
    async fn connect(addr: SocketAddr, nick: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        stream.set_nodelay(true).unwrap();
        Self {
            peer: Peer::new(format!("id-{nick}"), nick),
            stream,
            pending: Vec::new(),
        }
    }

    /// Connects and completes authorization.
    async fn join(addr: SocketAddr, nick: &str) -> Self {
        let mut client = Self::connect(addr, nick).await;
        client.send(&input::authorization(&client.peer.clone())).await;
        let ack = client.next().await;
        assert!(ack.content.starts_with(ACK_OK), "unexpected ack: {}", ack.content);
        client
    }

    async fn send(&mut self, msg: &Message) {
        let bytes = JsonCodec.encode(msg).unwrap();
        self.stream.write_all(&bytes).await.unwrap();
        // One read is one message on the server side; keep writes apart.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    async fn say(&mut self, line: &str) {
        let msg = input::compose(&self.peer, line).unwrap();
        self.send(&msg).await;
    }

    async fn next(&mut self) -> Message {
        timeout(WAIT, self.read_message())
            .await
            .expect("timed out waiting for a message")
            .expect("server closed the connection")
    }

    /// `None` once the server has closed the socket.
    async fn read_message(&mut self) -> Option<Message> {
        loop {
            let parsed = {
                let mut stream =
                    serde_json::Deserializer::from_slice(&self.pending).into_iter::<Message>();
                match stream.next() {
                    Some(Ok(msg)) => Some((msg, stream.byte_offset())),
                    Some(Err(e)) if e.is_eof() => None,
                    Some(Err(e)) => panic!("server sent malformed JSON: {e}"),
                    None => None,
                }
            };
            if let Some((msg, used)) = parsed {
                self.pending.drain(..used);
                return Some(msg);
            }

            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await.ok()?;
            if n == 0 {
                return None;
            }
            self.pending.extend_from_slice(&buf[..n]);
        }
    }

    /// Asserts nothing arrives for a little while.
    async fn expect_silence(&mut self) {
        let got = timeout(Duration::from_millis(300), self.read_message()).await;
        if let Ok(Some(msg)) = got {
            panic!("expected silence, got {msg:?}");
        }
    }

    /// Asserts the server closes the socket.
    async fn expect_closed(&mut self) {
        let got = timeout(WAIT, self.read_message()).await.expect("socket stayed open");
        assert!(got.is_none(), "expected close, got {got:?}");
    }
}

// =========================================================================
// Authorization
// =========================================================================

#[tokio::test]
async fn test_authorize_ack_lists_commands() {
    let server = start_default().await;
    let mut bob = Client::connect(server.addr, "bob").await;

    bob.send(&input::authorization(&bob.peer.clone())).await;
    let ack = bob.next().await;

    assert_eq!(ack.kind, MessageType::Authorization);
    assert_eq!(ack.sender.nickname, "Server-test");
    assert_eq!(ack.recipient_nickname, "bob");
    assert!(ack.content.starts_with("Ok/Welcome bob"));
    assert!(ack.content.contains("Server.Who is in chat?"));
    assert!(ack.content.contains("Server.Bye"));
    assert_eq!(server.registry.snapshot().await, vec!["bob"]);
}

#[tokio::test]
async fn test_authorize_duplicate_nickname_is_rejected_on_new_socket() {
    let server = start_default().await;
    let mut first = Client::join(server.addr, "bob").await;
    let mut second = Client::connect(server.addr, "bob").await;
    second.peer = Peer::new("another-id", "bob");

    second.send(&input::authorization(&second.peer.clone())).await;

    let reply = second.next().await;
    assert!(reply.content.starts_with(ACK_REJECTED));
    first.expect_silence().await;
    assert_eq!(server.registry.len().await, 1);
}

#[tokio::test]
async fn test_unauthorized_sender_is_told_not_here() {
    let server = start_default().await;
    let _alice = Client::join(server.addr, "alice").await;
    let mut stranger = Client::connect(server.addr, "mallory").await;

    stranger.say("hello?").await;

    let reply = stranger.next().await;
    assert_eq!(reply.kind, MessageType::ServerQuery);
    assert!(reply.content.contains("not here"));
}

// =========================================================================
// Routing
// =========================================================================

#[tokio::test]
async fn test_broadcast_reaches_everyone_including_sender() {
    let server = start_default().await;
    let mut alice = Client::join(server.addr, "alice").await;
    let mut bob = Client::join(server.addr, "bob").await;
    let mut carol = Client::join(server.addr, "carol").await;

    alice.say("hi all").await;

    for (client, nick) in [(&mut alice, "alice"), (&mut bob, "bob"), (&mut carol, "carol")] {
        let msg = client.next().await;
        assert_eq!(msg.kind, MessageType::Broadcast);
        assert_eq!(msg.content, "hi all");
        assert_eq!(msg.sender.nickname, "alice");
        assert_eq!(msg.recipient_nickname, nick);
    }
}

#[tokio::test]
async fn test_private_message_reaches_only_recipient() {
    let server = start_default().await;
    let mut alice = Client::join(server.addr, "alice").await;
    let mut bob = Client::join(server.addr, "bob").await;
    let mut carol = Client::join(server.addr, "carol").await;

    alice.say("!bob:meet at 5: room B").await;

    let msg = bob.next().await;
    assert_eq!(msg.kind, MessageType::Private);
    assert_eq!(msg.content, "meet at 5: room B");
    assert_eq!(msg.sender.nickname, "alice");
    alice.expect_silence().await;
    carol.expect_silence().await;
}

#[tokio::test]
async fn test_private_message_to_absent_nickname_notifies_sender() {
    let server = start_default().await;
    let mut alice = Client::join(server.addr, "alice").await;

    alice.say("!X:text").await;

    let reply = alice.next().await;
    assert_eq!(reply.sender.nickname, "Server-test");
    assert!(reply.content.contains("[X]"));
}

#[tokio::test]
async fn test_who_is_in_chat_lists_join_order() {
    let server = start_default().await;
    let mut a = Client::join(server.addr, "A").await;
    let _b = Client::join(server.addr, "B").await;
    let _c = Client::join(server.addr, "C").await;

    a.say("Server.Who is in chat?").await;

    assert_eq!(a.next().await.content, "A\nB\nC");
}

#[tokio::test]
async fn test_unknown_server_query_gets_reply() {
    let server = start_default().await;
    let mut a = Client::join(server.addr, "A").await;

    a.say("Server.Sing a song?").await;

    let reply = a.next().await;
    assert_eq!(reply.kind, MessageType::ServerQuery);
    assert_eq!(reply.content, lanchat::dispatcher::UNKNOWN_COMMAND_REPLY);
}

#[tokio::test]
async fn test_garbage_frame_is_ignored_and_connection_survives() {
    let server = start_default().await;
    let mut a = Client::join(server.addr, "A").await;

    a.stream.write_all(b"{\"Type\": \"Broadc").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    a.say("still alive").await;

    assert_eq!(a.next().await.content, "still alive");
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_sign_off_closes_socket_and_frees_nickname() {
    let server = start_default().await;
    let mut bob = Client::join(server.addr, "bob").await;

    bob.say(SIGN_OFF).await;

    bob.expect_closed().await;
    eventually(&server.registry, "bob to leave", |nicks| nicks.is_empty()).await;
    let _again = Client::join(server.addr, "bob").await;
}

#[tokio::test]
async fn test_sign_off_releases_connection_slot_while_client_lingers() {
    let server = start(RelayConfig {
        max_connections: 1,
        ..RelayConfig::default()
    })
    .await;
    let mut bob = Client::join(server.addr, "bob").await;
    bob.say(SIGN_OFF).await;
    bob.expect_closed().await;

    // bob never closes his socket; carol must still get in.
    let carol = Client::join(server.addr, "carol").await;

    assert_eq!(server.registry.snapshot().await, vec!["carol"]);
    drop((bob, carol));
}

#[tokio::test]
async fn test_authorization_after_sign_off_on_same_socket_is_not_registered() {
    let server = start_default().await;
    let mut bob = Client::join(server.addr, "bob").await;
    bob.say(SIGN_OFF).await;
    bob.expect_closed().await;

    // The server may already have torn the socket down; a failed write is
    // as good as an ignored one.
    let again = JsonCodec.encode(&input::authorization(&bob.peer)).unwrap();
    let _ = bob.stream.write_all(&again).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(server.registry.is_empty().await);
}

#[tokio::test]
async fn test_second_identity_on_one_socket_is_rejected() {
    let server = start_default().await;
    let mut bob = Client::join(server.addr, "bob").await;

    bob.send(&input::authorization(&Peer::new("id-carol", "carol"))).await;

    let reply = bob.next().await;
    assert_eq!(reply.kind, MessageType::Authorization);
    assert!(reply.content.starts_with(ACK_REJECTED));
    assert_eq!(server.registry.snapshot().await, vec!["bob"]);

    drop(bob);
    eventually(&server.registry, "the socket's session to be retired", |nicks| {
        nicks.is_empty()
    })
    .await;
}

#[tokio::test]
async fn test_abrupt_disconnect_retires_session() {
    let server = start_default().await;
    let bob = Client::join(server.addr, "bob").await;
    let mut alice = Client::join(server.addr, "alice").await;

    drop(bob);

    eventually(&server.registry, "bob to be retired", |nicks| nicks == ["alice"]).await;
    alice.say("Server.Who is in chat?").await;
    assert_eq!(alice.next().await.content, "alice");
}

// =========================================================================
// Limits and shutdown
// =========================================================================

#[tokio::test]
async fn test_connection_limit_defers_extra_clients() {
    let server = start(RelayConfig {
        max_connections: 1,
        ..RelayConfig::default()
    })
    .await;
    let first = Client::join(server.addr, "first").await;
    let mut second = Client::connect(server.addr, "second").await;

    second.send(&input::authorization(&second.peer.clone())).await;
    second.expect_silence().await;

    drop(first);

    let ack = second.next().await;
    assert!(ack.content.starts_with(ACK_OK));
}

#[tokio::test]
async fn test_shutdown_closes_clients_and_returns() {
    let server = start_default().await;
    let mut alice = Client::join(server.addr, "alice").await;

    server.stop.cancel();

    let result = timeout(WAIT, server.handle).await.expect("server did not stop");
    assert!(result.unwrap().is_ok());
    alice.expect_closed().await;
    assert!(server.registry.is_empty().await);
    assert!(TcpStream::connect(server.addr).await.is_err(), "listener still bound");
}
