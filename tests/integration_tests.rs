//! Integration tests for the relay server
//!
//! These tests run a real server on an ephemeral port and talk to it over
//! WebSocket connections.

use client::network::Client;
use client::view::PeerView;
use futures_util::{SinkExt, StreamExt};
use server::network::Server;
use server::session::Session;
use shared::{Packet, Player};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(200);

/// Starts a server in the background and returns its WebSocket URL
async fn start_server() -> String {
    let mut server = Server::with_session("127.0.0.1:0", Session::with_seed(2024))
        .await
        .expect("Failed to bind server");
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    format!("ws://{}", addr)
}

async fn expect_packet(client: &mut Client) -> Packet {
    client
        .recv(WAIT)
        .await
        .expect("Connection failed")
        .expect("Timed out waiting for packet")
}

async fn expect_quiet(client: &mut Client) {
    let packet = client.recv(QUIET).await.expect("Connection failed");
    assert!(packet.is_none(), "Unexpected packet: {:?}", packet);
}

/// Connects, joins and returns the snapshot the server answered with
async fn join(url: &str) -> (Client, Vec<Player>) {
    let mut client = Client::connect(url).await.expect("Failed to connect");
    client.join().await.unwrap();

    match expect_packet(&mut client).await {
        Packet::Snapshot { players } => (client, players),
        other => panic!("Expected snapshot, got {:?}", other),
    }
}

/// SESSION PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Two clients join, one moves and leaves, a third joins afterwards
    #[tokio::test]
    async fn join_move_leave_scenario() {
        let url = start_server().await;

        let (mut a, snapshot_a) = join(&url).await;
        assert_eq!(snapshot_a.len(), 1);
        let player_a = snapshot_a[0];
        assert_eq!(player_a.id, 0);
        assert!((350..750).contains(&player_a.x));
        assert_eq!(player_a.y, 1000);

        let (mut b, snapshot_b) = join(&url).await;
        assert_eq!(snapshot_b.len(), 2);
        assert_eq!(snapshot_b[0], player_a);
        let player_b = snapshot_b[1];
        assert_eq!(player_b.id, 1);

        assert_eq!(
            expect_packet(&mut a).await,
            Packet::PlayerJoined { player: player_b }
        );
        expect_quiet(&mut b).await;

        a.send_move(10, 20, "walk").await.unwrap();
        assert_eq!(
            expect_packet(&mut b).await,
            Packet::PlayerMoved {
                player: Player::new(0, 10, 20),
                anim: "walk".to_string()
            }
        );
        expect_quiet(&mut a).await;

        a.close().await.unwrap();
        assert_eq!(expect_packet(&mut b).await, Packet::PlayerLeft { id: 0 });

        let (mut c, snapshot_c) = join(&url).await;
        assert_eq!(snapshot_c.len(), 3);
        assert_eq!(snapshot_c[0], Player::retired(0));
        assert_eq!(snapshot_c[1], player_b);
        assert_eq!(snapshot_c[2].id, 2);

        assert_eq!(
            expect_packet(&mut b).await,
            Packet::PlayerJoined {
                player: snapshot_c[2]
            }
        );
        expect_quiet(&mut c).await;
    }

    /// Probe acknowledgments reach every connection, the sender included
    #[tokio::test]
    async fn probe_ack_reaches_everyone() {
        let url = start_server().await;

        let (mut a, _) = join(&url).await;
        let (mut b, _) = join(&url).await;
        assert!(matches!(
            expect_packet(&mut a).await,
            Packet::PlayerJoined { .. }
        ));

        b.probe().await.unwrap();

        assert_eq!(expect_packet(&mut a).await, Packet::ProbeAck);
        assert_eq!(expect_packet(&mut b).await, Packet::ProbeAck);
    }

    /// Snapshot entries always line up with their ids
    #[tokio::test]
    async fn sequential_joins_get_contiguous_ids() {
        let url = start_server().await;
        let mut clients = Vec::new();

        for expected in 0..6u32 {
            let (client, snapshot) = join(&url).await;
            assert_eq!(snapshot.len(), expected as usize + 1);
            for (index, player) in snapshot.iter().enumerate() {
                assert_eq!(player.id as usize, index);
            }
            clients.push(client);
        }
    }

    /// A client view built from relayed packets tracks its peers
    #[tokio::test]
    async fn peer_view_follows_session() {
        let url = start_server().await;

        let (mut a, snapshot) = join(&url).await;
        let mut view = PeerView::new();
        view.apply(&Packet::Snapshot { players: snapshot });

        let (mut b, _) = join(&url).await;
        view.apply(&expect_packet(&mut a).await);
        assert_eq!(view.len(), 2);

        b.send_move(-5, 42, "jump").await.unwrap();
        view.apply(&expect_packet(&mut a).await);
        assert_eq!(view.player(1), Some(&Player::new(1, -5, 42)));
        assert_eq!(view.animation(1), Some("jump"));

        b.close().await.unwrap();
        view.apply(&expect_packet(&mut a).await);
        assert!(view.player(1).is_none());
    }
}

/// PROTOCOL VIOLATION TESTS
mod violation_tests {
    use super::*;

    /// Moves and probes sent before joining are dropped without a reply
    #[tokio::test]
    async fn packets_before_join_are_ignored() {
        let url = start_server().await;

        let (mut watcher, _) = join(&url).await;

        let mut early = Client::connect(&url).await.unwrap();
        early.send_move(1, 2, "walk").await.unwrap();
        early.probe().await.unwrap();
        expect_quiet(&mut watcher).await;
        expect_quiet(&mut early).await;

        // The connection is still usable afterwards
        early.join().await.unwrap();
        match expect_packet(&mut early).await {
            Packet::Snapshot { players } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[1].y, 1000);
            }
            other => panic!("Expected snapshot, got {:?}", other),
        }
    }

    /// Garbage frames and server-only packets leave the connection open
    #[tokio::test]
    async fn malformed_frames_are_dropped() {
        let url = start_server().await;
        let (mut watcher, _) = join(&url).await;

        let (mut raw, _) = connect_async(url.as_str()).await.unwrap();
        raw.send(Message::binary(vec![0xff, 0xff, 0xff, 0xff, 0x00]))
            .await
            .unwrap();
        raw.send(Message::text("newplayer")).await.unwrap();
        raw.send(Message::binary(bincode::serialize(&Packet::ProbeAck).unwrap()))
            .await
            .unwrap();
        raw.send(Message::binary(shared::encode(&Packet::Join).unwrap()))
            .await
            .unwrap();

        let reply = tokio::time::timeout(WAIT, raw.next())
            .await
            .expect("Timed out waiting for snapshot")
            .expect("Connection closed")
            .unwrap();
        match reply {
            Message::Binary(data) => match bincode::deserialize::<Packet>(&data).unwrap() {
                Packet::Snapshot { players } => assert_eq!(players.len(), 2),
                other => panic!("Expected snapshot, got {:?}", other),
            },
            other => panic!("Expected binary frame, got {:?}", other),
        }

        assert!(matches!(
            expect_packet(&mut watcher).await,
            Packet::PlayerJoined { player } if player.id == 1
        ));
    }

    /// A failed handshake never allocates a player
    #[tokio::test]
    async fn failed_handshake_allocates_nothing() {
        let url = start_server().await;
        let addr = url.trim_start_matches("ws://").to_string();

        let mut stream = TcpStream::connect(addr.as_str()).await.unwrap();
        stream.write_all(b"hello\r\n\r\n").await.unwrap();
        drop(stream);

        let (_client, snapshot) = join(&url).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, 0);
    }

    /// Dropping the socket without a close frame still retires the player
    #[tokio::test]
    async fn abrupt_disconnect_retires_player() {
        let url = start_server().await;

        let (mut a, _) = join(&url).await;
        let (b, _) = join(&url).await;
        assert!(matches!(
            expect_packet(&mut a).await,
            Packet::PlayerJoined { .. }
        ));

        drop(b);
        assert_eq!(expect_packet(&mut a).await, Packet::PlayerLeft { id: 1 });
        expect_quiet(&mut a).await;

        let (_c, snapshot) = join(&url).await;
        assert_eq!(snapshot[1], Player::retired(1));
        assert_eq!(snapshot[2].id, 2);
    }
}
