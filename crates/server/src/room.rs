//! Room state.
//!
//! A room is an isolated game session: a phase, a join-ordered set of
//! players, and at most one active item. Rooms are plain values; all
//! transitions go through the reducer in [`crate::command`].

use crate::entity::{Item, Player, PlayerId};
use protocol::{Grid, Phase, PlayerSnapshot, Position, ServerEvent};
use std::collections::HashSet;
use std::time::Instant;

/// Server-generated room identifier, also the client's route to the room.
pub type RoomId = String;

/// One game session.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub phase: Phase,
    pub grid: Grid,
    pub max_players: usize,
    /// Join order is preserved; tick processing and shared-item
    /// resolution follow it.
    pub players: Vec<Player>,
    pub item: Option<Item>,
    pub tick: u64,
    /// Wall clock of the last processed tick, for diagnostics only.
    pub last_tick: Option<Instant>,
}

impl Room {
    /// A fresh, empty room awaiting its creator.
    pub fn new(id: RoomId, grid: Grid, max_players: usize) -> Self {
        Self {
            id,
            phase: Phase::Init,
            grid,
            max_players,
            players: Vec::new(),
            item: None,
            tick: 0,
            last_tick: None,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Every cell occupied by any player's head or body.
    pub fn occupied_cells(&self) -> HashSet<Position> {
        self.players.iter().flat_map(Player::occupied).collect()
    }

    pub fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }

    /// Per-tick snapshot broadcast to every participant.
    pub fn game_update(&self) -> ServerEvent {
        ServerEvent::GameUpdate {
            state: self.phase,
            players: self.player_snapshots(),
            fruit: self.item.as_ref().map(Item::snapshot),
        }
    }

    /// Membership update broadcast on create and join.
    pub fn membership_update(&self) -> ServerEvent {
        ServerEvent::CreateRoomAck {
            state: self.phase,
            room_id: self.id.clone(),
            players: self.player_snapshots(),
        }
    }
}
