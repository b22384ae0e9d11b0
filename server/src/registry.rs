use log::info;
use rand::Rng;
use shared::{Player, PlayerId, SPAWN_X_MIN, SPAWN_X_SPREAD, SPAWN_Y};

/// Append-only table of every player created in this process.
///
/// Ids are handed out as the current length, so `players[i].id == i` always
/// holds. Disconnected players are overwritten with [`Player::retired`] rather
/// than removed, which keeps ids stable and never reused.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    players: Vec<Player>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
        }
    }

    /// Creates the next player at a random spot on the spawn band and appends it.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R) -> Player {
        let id = self.players.len() as PlayerId;
        let spawn_x = SPAWN_X_MIN + rng.gen_range(0..SPAWN_X_SPREAD);

        let player = Player::new(id, spawn_x, SPAWN_Y);

        info!("Added player {} at ({}, {})", id, player.x, player.y);
        self.players.push(player);
        player
    }

    /// Resets a player to the origin. The slot stays in place.
    pub fn retire(&mut self, id: PlayerId) -> bool {
        match self.players.get_mut(id as usize) {
            Some(player) => {
                *player = Player::retired(id);
                info!("Retired player {}", id);
                true
            }
            None => false,
        }
    }

    /// Stores a client-reported position as-is and returns the updated record.
    pub fn update_position(&mut self, id: PlayerId, x: i32, y: i32) -> Option<Player> {
        let player = self.players.get_mut(id as usize)?;
        player.x = x;
        player.y = y;
        Some(*player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// Every player ever spawned, ordered by id, retired ones included.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.clone()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
