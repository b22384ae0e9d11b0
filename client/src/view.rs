use log::debug;
use shared::{Packet, Player, PlayerId};
use std::collections::{BTreeMap, HashMap};

/// Client-side mirror of the session, rebuilt purely from server packets
#[derive(Debug, Clone, Default)]
pub struct PeerView {
    players: BTreeMap<PlayerId, Player>,
    animations: HashMap<PlayerId, String>,
    probe_acks: u32,
    joined: bool,
}

impl PeerView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one server packet into the view.
    ///
    /// Returns false for packets a server never sends.
    pub fn apply(&mut self, packet: &Packet) -> bool {
        match packet {
            Packet::Snapshot { players } => {
                self.players = players.iter().map(|p| (p.id, *p)).collect();
                self.animations.clear();
                self.joined = true;
            }
            Packet::PlayerJoined { player } => {
                self.players.insert(player.id, *player);
            }
            Packet::PlayerMoved { player, anim } => {
                self.players.insert(player.id, *player);
                self.animations.insert(player.id, anim.clone());
            }
            Packet::PlayerLeft { id } => {
                self.players.remove(id);
                self.animations.remove(id);
            }
            Packet::ProbeAck => {
                self.probe_acks += 1;
            }
            other => {
                debug!("Ignoring client packet {:?}", other);
                return false;
            }
        }
        true
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Known players ordered by id
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn animation(&self, id: PlayerId) -> Option<&str> {
        self.animations.get(&id).map(String::as_str)
    }

    pub fn probe_acks(&self) -> u32 {
        self.probe_acks
    }

    /// True once a snapshot has arrived
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
