//! Connection bookkeeping for the relay server
//!
//! Tracks every live transport connection together with:
//! - The player it owns for its whole lifetime
//! - Where it is in the `Connecting -> Active` handshake
//! - The outbound queue its writer task drains
//!
//! A connection is removed from the table as soon as the transport reports
//! it closed. The player it owned stays in the registry as a retired entry.

use log::{debug, info};
use shared::{Packet, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Server-internal handle for one transport connection.
pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Player allocated but not yet announced; only `Join` is accepted
    Connecting,
    /// Joined; movement and probes are relayed
    Active,
}

/// Who receives an outbound packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Only(ConnectionId),
    AllExcept(ConnectionId),
    All,
}

impl Audience {
    fn includes(&self, connection_id: ConnectionId) -> bool {
        match *self {
            Audience::Only(target) => target == connection_id,
            Audience::AllExcept(excluded) => excluded != connection_id,
            Audience::All => true,
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    /// The single player this connection owns
    pub player_id: PlayerId,
    pub state: ConnectionState,
    sender: mpsc::UnboundedSender<Packet>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        player_id: PlayerId,
        sender: mpsc::UnboundedSender<Packet>,
    ) -> Self {
        Self {
            id,
            addr,
            player_id,
            state: ConnectionState::Connecting,
            sender,
        }
    }

    /// Queues a packet for the writer task. A closed queue means the
    /// connection is already going away, so the packet is simply dropped.
    pub fn send(&self, packet: Packet) {
        if self.sender.send(packet).is_err() {
            debug!("Outbound queue for connection {} is closed", self.id);
        }
    }
}

/// Table of live connections keyed by connection id
#[derive(Debug, Default)]
pub struct ClientManager {
    connections: HashMap<ConnectionId, Connection>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Registers a freshly accepted connection in the `Connecting` state.
    ///
    /// Returns false if the id is already in use; the existing entry is kept.
    pub fn add_connection(&mut self, connection: Connection) -> bool {
        if self.connections.contains_key(&connection.id) {
            return false;
        }

        info!(
            "Connection {} from {} owns player {}",
            connection.id, connection.addr, connection.player_id
        );
        self.connections.insert(connection.id, connection);
        true
    }

    /// Drops a connection and hands back its record so the caller can retire
    /// the player it owned.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&connection_id)?;
        info!("Connection {} closed", connection.id);
        Some(connection)
    }

    /// Moves a connection from `Connecting` to `Active`.
    ///
    /// Returns false if the connection is unknown or already active.
    pub fn activate(&mut self, connection_id: ConnectionId) -> bool {
        match self.connections.get_mut(&connection_id) {
            Some(connection) if connection.state == ConnectionState::Connecting => {
                connection.state = ConnectionState::Active;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn state_of(&self, connection_id: ConnectionId) -> Option<ConnectionState> {
        self.connections.get(&connection_id).map(|c| c.state)
    }

    pub fn player_of(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.connections.get(&connection_id).map(|c| c.player_id)
    }

    /// Queues `packet` on every connection in `audience`.
    ///
    /// Returns how many connections the packet was queued for.
    pub fn deliver(&self, packet: &Packet, audience: Audience) -> usize {
        let mut delivered = 0;
        for connection in self.connections.values() {
            if audience.includes(connection.id) {
                connection.send(packet.clone());
                delivered += 1;
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
