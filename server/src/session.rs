//! Serialized processing of every inbound event
//!
//! The session owns the registry and the connection table. Each call handles
//! one event to completion, including queueing every resulting packet, so
//! the caller only has to guarantee that calls are not interleaved.

use crate::client_manager::{Audience, ClientManager, Connection, ConnectionId, ConnectionState};
use crate::registry::Registry;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Packet, Player, PlayerId};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc;

/// Reasons an inbound packet is dropped without effect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    #[error("connection {0} sent a packet before joining")]
    NotJoined(ConnectionId),
    #[error("connection {0} already joined")]
    AlreadyJoined(ConnectionId),
    #[error("connection {0} sent a server-only packet")]
    UnexpectedPacket(ConnectionId),
    #[error("player {0} is missing from the registry")]
    UnknownPlayer(PlayerId),
}

pub struct Session {
    registry: Registry,
    clients: ClientManager,
    rng: StdRng,
}

impl Session {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Session whose spawn positions are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: Registry::new(),
            clients: ClientManager::new(),
            rng,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    /// Allocates a player for a new connection.
    ///
    /// Nobody is told about the player yet; that waits for its `Join`.
    /// Returns None, without spawning, if the connection id is already taken.
    pub fn on_connect(
        &mut self,
        connection_id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Packet>,
    ) -> Option<Player> {
        if self.clients.contains(connection_id) {
            warn!("Connection {} is already registered", connection_id);
            return None;
        }

        let player = self.registry.spawn(&mut self.rng);
        let connection = Connection::new(connection_id, addr, player.id, sender);
        self.clients.add_connection(connection);
        Some(player)
    }

    /// Retires the connection's player and tells everyone else it left.
    ///
    /// Returns the retired id, or None if the connection was already gone.
    pub fn on_disconnect(&mut self, connection_id: ConnectionId) -> Option<PlayerId> {
        let connection = self.clients.remove_connection(connection_id)?;
        let id = connection.player_id;

        info!("User with id {} disconnected", id);
        self.registry.retire(id);
        self.clients
            .deliver(&Packet::PlayerLeft { id }, Audience::AllExcept(connection_id));

        Some(id)
    }

    /// Applies one inbound packet from `connection_id`.
    pub fn handle_packet(
        &mut self,
        connection_id: ConnectionId,
        packet: Packet,
    ) -> Result<(), ProtocolViolation> {
        let state = self
            .clients
            .state_of(connection_id)
            .ok_or(ProtocolViolation::UnknownConnection(connection_id))?;

        match (state, packet) {
            (ConnectionState::Connecting, Packet::Join) => self.join(connection_id),
            (ConnectionState::Active, Packet::Join) => {
                Err(ProtocolViolation::AlreadyJoined(connection_id))
            }
            (ConnectionState::Active, Packet::Move { x, y, anim }) => {
                self.move_player(connection_id, x, y, anim)
            }
            (ConnectionState::Active, Packet::Probe) => {
                self.probe(connection_id);
                Ok(())
            }
            (ConnectionState::Connecting, packet) if packet.is_client_packet() => {
                Err(ProtocolViolation::NotJoined(connection_id))
            }
            _ => Err(ProtocolViolation::UnexpectedPacket(connection_id)),
        }
    }

    fn join(&mut self, connection_id: ConnectionId) -> Result<(), ProtocolViolation> {
        let id = self
            .clients
            .player_of(connection_id)
            .ok_or(ProtocolViolation::UnknownConnection(connection_id))?;
        let player = *self
            .registry
            .get(id)
            .ok_or(ProtocolViolation::UnknownPlayer(id))?;

        self.clients.activate(connection_id);
        info!("New player with id: {}", id);

        let snapshot = Packet::Snapshot {
            players: self.registry.snapshot(),
        };
        self.clients.deliver(&snapshot, Audience::Only(connection_id));
        self.clients
            .deliver(&Packet::PlayerJoined { player }, Audience::AllExcept(connection_id));

        Ok(())
    }

    fn move_player(
        &mut self,
        connection_id: ConnectionId,
        x: i32,
        y: i32,
        anim: String,
    ) -> Result<(), ProtocolViolation> {
        let id = self
            .clients
            .player_of(connection_id)
            .ok_or(ProtocolViolation::UnknownConnection(connection_id))?;
        let player = self
            .registry
            .update_position(id, x, y)
            .ok_or(ProtocolViolation::UnknownPlayer(id))?;

        debug!("Player {} moved to ({}, {}) [{}]", id, x, y, anim);
        self.clients.deliver(
            &Packet::PlayerMoved { player, anim },
            Audience::AllExcept(connection_id),
        );

        Ok(())
    }

    fn probe(&self, connection_id: ConnectionId) {
        info!("Probe from connection {}", connection_id);
        self.clients.deliver(&Packet::ProbeAck, Audience::All);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
