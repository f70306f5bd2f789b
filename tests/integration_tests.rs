//! Integration tests for the arena server and client
//!
//! These tests run a real server on a loopback UDP socket and talk to it
//! either with raw sockets or through the client library.

use client::events::GameEvent;
use client::game::GameClient;
use server::network::{Server, ServerConfig};
use shared::codec::{decode_payload, is_handshake_response, unframe};
use shared::{GameState, HANDSHAKE_REQUEST, MAX_FRAME_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout, Instant};

async fn start_server(players: usize, client_timeout: Duration) -> SocketAddr {
    let config = ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        players,
        client_timeout,
        ..ServerConfig::default()
    };
    let mut server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn raw_peer() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Next unframed message from the server, if one arrives in time.
async fn receive(socket: &UdpSocket, wait: Duration) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; MAX_FRAME_SIZE];
    let (len, _) = timeout(wait, socket.recv_from(&mut buf)).await.ok()?.ok()?;
    unframe(&buf[..len]).ok()
}

/// Sends handshakes until the server answers, either with a pong or with
/// a state broadcast that already includes this peer.
async fn handshake(socket: &UdpSocket, server: SocketAddr) -> bool {
    for _ in 0..5 {
        socket.send_to(&[HANDSHAKE_REQUEST], server).await.unwrap();
        if let Some(message) = receive(socket, Duration::from_millis(200)).await {
            if is_handshake_response(&message) || decode_payload(&message).is_ok() {
                return true;
            }
        }
    }
    false
}

/// HANDSHAKE TESTS
mod handshake_tests {
    use super::*;

    #[tokio::test]
    async fn server_answers_handshake() {
        let server = start_server(2, Duration::from_secs(5)).await;
        let peer = raw_peer().await;

        assert!(handshake(&peer, server).await);
    }

    #[tokio::test]
    async fn full_lobby_ignores_extra_peer() {
        let server = start_server(2, Duration::from_secs(5)).await;
        let first = raw_peer().await;
        let second = raw_peer().await;
        let third = raw_peer().await;

        assert!(handshake(&first, server).await);
        assert!(handshake(&second, server).await);

        third.send_to(&[HANDSHAKE_REQUEST], server).await.unwrap();
        assert!(receive(&third, Duration::from_millis(300)).await.is_none());
    }

    #[tokio::test]
    async fn corrupt_datagrams_are_tolerated() {
        let server = start_server(1, Duration::from_secs(5)).await;
        let peer = raw_peer().await;

        peer.send_to(&[], server).await.unwrap();
        peer.send_to(&[0xff, 0xfe, 0xfd], server).await.unwrap();
        peer.send_to(b"not a key", server).await.unwrap();

        assert!(handshake(&peer, server).await);
    }
}

/// SESSION TESTS
mod session_tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_starts_when_lobby_fills() {
        let server = start_server(1, Duration::from_secs(5)).await;
        let peer = raw_peer().await;
        assert!(handshake(&peer, server).await);

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut payload = None;
        while payload.is_none() && Instant::now() < deadline {
            if let Some(message) = receive(&peer, Duration::from_millis(200)).await {
                payload = decode_payload(&message).ok();
            }
        }

        let payload = payload.expect("no state broadcast after the lobby filled");
        assert_eq!(payload.state, GameState::Paused);
        assert_eq!(payload.map_level, 1);
        assert!(payload.opponents.is_empty());
        assert_eq!(payload.player.body.len(), 1);
    }

    #[tokio::test]
    async fn client_starts_game_with_confirm() {
        let server = start_server(1, Duration::from_secs(5)).await;
        let mut client = GameClient::connect(&server.to_string(), 40, 40)
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(3);
        let mut events = Vec::new();
        while client.state() != GameState::Ongoing && Instant::now() < deadline {
            client.press_key('↵');
            sleep(Duration::from_millis(50)).await;
            events.extend(client.update_payload());
        }

        assert_eq!(client.state(), GameState::Ongoing);
        assert!(events.contains(&GameEvent::GameStarted));
        assert_eq!(client.map().level(), 1);
    }

    #[tokio::test]
    async fn silent_peer_reopens_lobby() {
        let server = start_server(1, Duration::from_millis(300)).await;
        let first = raw_peer().await;
        assert!(handshake(&first, server).await);

        sleep(Duration::from_millis(1200)).await;

        let second = raw_peer().await;
        assert!(handshake(&second, server).await);
    }
}
