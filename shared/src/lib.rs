use serde::{Deserialize, Serialize};

/// Lowest x coordinate a freshly spawned player can receive.
pub const SPAWN_X_MIN: i32 = 350;
/// Width of the spawn band; spawn x is drawn from `[SPAWN_X_MIN, SPAWN_X_MIN + SPAWN_X_SPREAD)`.
pub const SPAWN_X_SPREAD: i32 = 400;
pub const SPAWN_Y: i32 = 1000;

pub type PlayerId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client -> server
    Join,
    Move {
        x: i32,
        y: i32,
        anim: String,
    },
    Probe,

    // Server -> client
    Snapshot {
        players: Vec<Player>,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerMoved {
        player: Player,
        anim: String,
    },
    ProbeAck,
    PlayerLeft {
        id: PlayerId,
    },
}

impl Packet {
    /// True for the packets a client is allowed to send.
    pub fn is_client_packet(&self) -> bool {
        matches!(self, Packet::Join | Packet::Move { .. } | Packet::Probe)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub x: i32,
    pub y: i32,
}

impl Player {
    pub fn new(id: PlayerId, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    /// The record left behind once a player's connection is gone.
    pub fn retired(id: PlayerId) -> Self {
        Self { id, x: 0, y: 0 }
    }
}

pub fn encode(packet: &Packet) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(packet)
}

pub fn decode(bytes: &[u8]) -> Result<Packet, bincode::Error> {
    bincode::deserialize(bytes)
}
