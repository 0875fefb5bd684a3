//! Lifecycle commands and the room reducer.
//!
//! Every room transition is a [`Command`] applied by [`Room::apply`], a
//! pure function producing a new room value. Invalid commands (wrong
//! phase, unknown player, full room) return the prior state unchanged;
//! nothing here panics or escapes as an error.

use crate::engine;
use crate::entity::{Item, Player, PlayerId};
use crate::room::Room;
use protocol::{Color, Direction, Phase};
use std::time::Instant;

/// Closed set of room lifecycle transitions.
#[derive(Debug, Clone)]
pub enum Command {
    /// Seed a fresh room with its creating participant.
    CreateRoom {
        id: PlayerId,
        name: String,
        color: Color,
    },
    JoinRoom {
        id: PlayerId,
        name: String,
        color: Color,
    },
    StartGame {
        id: PlayerId,
    },
    DirectionUpdate {
        id: PlayerId,
        direction: Direction,
    },
    /// One simulation step for every participant, issued by the scheduler.
    AdvanceTick,
    Disconnect {
        id: PlayerId,
    },
    ExitGame {
        id: PlayerId,
    },
}

impl Room {
    /// Apply one command, returning the next room state. The prior value
    /// is never mutated, so concurrent readers always observe a
    /// consistent snapshot.
    pub fn apply(&self, command: &Command) -> Room {
        match command {
            Command::CreateRoom { id, name, color } => self.create(*id, name, *color),
            Command::JoinRoom { id, name, color } => self.join(*id, name, *color),
            Command::StartGame { id } => self.start(*id),
            Command::DirectionUpdate { id, direction } => self.steer(*id, *direction),
            Command::AdvanceTick => self.advance(),
            Command::Disconnect { id } => self.remove(*id, Phase::Loading),
            Command::ExitGame { id } => self.remove(*id, Phase::Select),
        }
    }

    fn create(&self, id: PlayerId, name: &str, color: Color) -> Room {
        if self.phase != Phase::Init || !self.players.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        next.phase = Phase::WaitingRoom;
        next.players
            .push(Player::spawn(id, name.to_string(), color, 0, &next.grid));
        next
    }

    fn join(&self, id: PlayerId, name: &str, color: Color) -> Room {
        let joinable = matches!(
            self.phase,
            Phase::WaitingRoom | Phase::Loading | Phase::Select
        );
        if !joinable || self.is_full() || self.contains_player(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.phase = Phase::WaitingRoom;
        let slot = next.players.len();
        next.players
            .push(Player::spawn(id, name.to_string(), color, slot, &next.grid));
        next
    }

    fn start(&self, id: PlayerId) -> Room {
        if self.is_playing() || self.is_empty() || !self.contains_player(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.phase = Phase::Playing;
        next.item = Item::spawn(&next.grid, &next.occupied_cells());
        next
    }

    fn steer(&self, id: PlayerId, direction: Direction) -> Room {
        if !self.contains_player(id) {
            return self.clone();
        }
        let mut next = self.clone();
        if let Some(player) = next.players.iter_mut().find(|p| p.id == id) {
            player.steer(direction);
        }
        next
    }

    /// Runs the movement engine for every participant in join order, then
    /// resolves item regeneration and self-collision resets serially in
    /// that same order.
    fn advance(&self) -> Room {
        if !self.is_playing() {
            return self.clone();
        }
        let mut next = self.clone();
        next.tick += 1;
        next.last_tick = Some(Instant::now());

        for index in 0..next.players.len() {
            let outcome = engine::step_player(&mut next.players[index], next.item.as_ref(), &next.grid);
            if outcome.consumed {
                let occupied = next.occupied_cells();
                next.item = Item::spawn(&next.grid, &occupied);
            }
            if outcome.collided {
                next.players[index] = next.players[index].reset();
                let occupied = next.occupied_cells();
                next.item = Item::spawn(&next.grid, &occupied);
            }
        }

        // A spawn frozen by a saturated board is retried every tick.
        if next.item.is_none() {
            next.item = Item::spawn(&next.grid, &next.occupied_cells());
        }
        next
    }

    fn remove(&self, id: PlayerId, phase_when_empty: Phase) -> Room {
        if !self.contains_player(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.players.retain(|p| p.id != id);
        if next.players.is_empty() {
            next.phase = phase_when_empty;
            next.item = None;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Grid, Position};

    const GRID: Grid = Grid::new(300, 10);

    fn fresh_room() -> Room {
        Room::new("abc123".to_string(), GRID, 4)
    }

    fn waiting_room() -> Room {
        fresh_room().apply(&Command::CreateRoom {
            id: 1,
            name: "ada".to_string(),
            color: Color::Green,
        })
    }

    fn playing_room() -> Room {
        waiting_room().apply(&Command::StartGame { id: 1 })
    }

    #[test]
    fn create_room_seeds_waiting_room() {
        let room = waiting_room();
        assert_eq!(room.phase, Phase::WaitingRoom);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].id, 1);
        assert!(room.item.is_none());
    }

    #[test]
    fn join_adds_participant_until_full() {
        let mut room = waiting_room();
        for id in 2..=4 {
            room = room.apply(&Command::JoinRoom {
                id,
                name: format!("p{id}"),
                color: Color::Blue,
            });
        }
        assert_eq!(room.players.len(), 4);
        assert_eq!(room.phase, Phase::WaitingRoom);

        let rejected = room.apply(&Command::JoinRoom {
            id: 5,
            name: "late".to_string(),
            color: Color::Red,
        });
        assert_eq!(rejected.players.len(), 4);
    }

    #[test]
    fn join_rejects_duplicate_participant() {
        let room = waiting_room();
        let next = room.apply(&Command::JoinRoom {
            id: 1,
            name: "ada again".to_string(),
            color: Color::Red,
        });
        assert_eq!(next.players.len(), 1);
        assert_eq!(next.players[0].name, "ada");
    }

    #[test]
    fn start_game_spawns_item_off_occupied_cells() {
        let room = playing_room();
        assert_eq!(room.phase, Phase::Playing);
        let item = room.item.as_ref().unwrap();
        assert!(!room.occupied_cells().contains(&item.position));
    }

    #[test]
    fn start_requires_a_participant() {
        let room = fresh_room().apply(&Command::StartGame { id: 1 });
        assert_eq!(room.phase, Phase::Init);
        assert!(room.item.is_none());
    }

    #[test]
    fn reducer_returns_new_value_without_mutating_prior() {
        let room = playing_room();
        let before = room.players[0].direction;
        let next = room.apply(&Command::DirectionUpdate {
            id: 1,
            direction: Direction::Up,
        });
        assert_eq!(room.players[0].direction, before);
        assert_eq!(next.players[0].direction, Direction::Up);
    }

    #[test]
    fn rapid_up_then_down_keeps_up() {
        let room = playing_room();
        let room = room.apply(&Command::DirectionUpdate {
            id: 1,
            direction: Direction::Up,
        });
        let room = room.apply(&Command::DirectionUpdate {
            id: 1,
            direction: Direction::Down,
        });
        assert_eq!(room.players[0].direction, Direction::Up);
    }

    #[test]
    fn direction_update_for_unknown_player_is_a_no_op() {
        let room = playing_room();
        let next = room.apply(&Command::DirectionUpdate {
            id: 99,
            direction: Direction::Up,
        });
        assert_eq!(next.players[0].direction, room.players[0].direction);
    }

    #[test]
    fn tick_consumes_item_and_respawns_it_disjointly() {
        let mut room = playing_room();
        // Head at (0,0) heading Right; plant the item one step ahead.
        room.item = Some(Item {
            color: Color::Red,
            size: 1,
            position: Position::new(10, 0),
        });

        let next = room.apply(&Command::AdvanceTick);

        let player = &next.players[0];
        assert_eq!(player.position, Position::new(10, 0));
        assert_eq!(player.score, 1);
        assert_eq!(player.segments, [Position::new(0, 0)]);

        let item = next.item.as_ref().unwrap();
        assert_ne!(item.position, Position::new(10, 0));
        assert!(!next.occupied_cells().contains(&item.position));
    }

    #[test]
    fn body_length_equals_score_across_ticks() {
        let mut room = playing_room();
        for _ in 0..25 {
            // Keep the item one step ahead of the head every few ticks.
            if room.tick % 5 == 0 {
                let player = &room.players[0];
                let ahead = GRID.advance(player.position, player.direction);
                room.item = Some(Item {
                    color: Color::Red,
                    size: 1,
                    position: ahead,
                });
            }
            room = room.apply(&Command::AdvanceTick);
            for player in &room.players {
                assert_eq!(player.segments.len(), player.score as usize);
            }
        }
        assert!(room.players[0].score > 0);
    }

    #[test]
    fn self_collision_resets_the_offender_only() {
        let mut room = waiting_room();
        room = room.apply(&Command::JoinRoom {
            id: 2,
            name: "bob".to_string(),
            color: Color::Blue,
        });
        room = room.apply(&Command::StartGame { id: 1 });

        // Force player 1 into a tail chase: body [(0,0)], head (10,0),
        // heading Left. Keep the item out of everyone's path.
        room.players[0].position = Position::new(10, 0);
        room.players[0].segments.push_back(Position::new(0, 0));
        room.players[0].score = 1;
        room.players[0].direction = Direction::Left;
        room.item = Some(Item {
            color: Color::Red,
            size: 1,
            position: Position::new(150, 150),
        });
        let bystander = room.players[1].clone();

        let next = room.apply(&Command::AdvanceTick);

        let offender = &next.players[0];
        assert_eq!(offender.score, 0);
        assert!(offender.segments.is_empty());
        assert_eq!(offender.id, 1);

        // The other participant advanced normally.
        let other = &next.players[1];
        assert_eq!(other.id, 2);
        assert_eq!(
            other.position,
            GRID.advance(bystander.position, bystander.direction)
        );
        // The reset also regenerated the item, still off every occupied cell.
        let item = next.item.as_ref().unwrap();
        assert!(!next.occupied_cells().contains(&item.position));
    }

    #[test]
    fn tick_outside_playing_is_a_no_op() {
        let room = waiting_room();
        let next = room.apply(&Command::AdvanceTick);
        assert_eq!(next.tick, 0);
        assert!(next.item.is_none());
    }

    #[test]
    fn disconnect_quiesces_an_emptied_room() {
        let room = playing_room();
        let next = room.apply(&Command::Disconnect { id: 1 });
        assert!(next.is_empty());
        assert_eq!(next.phase, Phase::Loading);
        assert!(next.item.is_none());
    }

    #[test]
    fn disconnect_of_one_of_many_keeps_playing() {
        let mut room = waiting_room();
        room = room.apply(&Command::JoinRoom {
            id: 2,
            name: "bob".to_string(),
            color: Color::Blue,
        });
        room = room.apply(&Command::StartGame { id: 2 });
        let next = room.apply(&Command::Disconnect { id: 1 });
        assert_eq!(next.players.len(), 1);
        assert_eq!(next.phase, Phase::Playing);
    }

    #[test]
    fn exit_game_recycles_an_emptied_room_to_select() {
        let room = playing_room();
        let next = room.apply(&Command::ExitGame { id: 1 });
        assert!(next.is_empty());
        assert_eq!(next.phase, Phase::Select);
    }

    #[test]
    fn loading_room_is_rejoinable_back_to_waiting() {
        let room = playing_room().apply(&Command::Disconnect { id: 1 });
        let next = room.apply(&Command::JoinRoom {
            id: 7,
            name: "eve".to_string(),
            color: Color::Purple,
        });
        assert_eq!(next.phase, Phase::WaitingRoom);
        assert_eq!(next.players.len(), 1);
    }

    #[test]
    fn saturated_board_freezes_then_thaws_item_spawn() {
        let tiny = Grid::new(20, 10);
        let mut room = Room::new("tiny00".to_string(), tiny, 4);
        room = room.apply(&Command::CreateRoom {
            id: 1,
            name: "ada".to_string(),
            color: Color::Green,
        });
        // Occupy all four cells: head plus three segments.
        room.players[0].segments =
            [Position::new(10, 0), Position::new(10, 10), Position::new(0, 10)]
                .into_iter()
                .collect();
        room.players[0].score = 3;

        // No free cell: the game starts with spawning frozen.
        let started = room.apply(&Command::StartGame { id: 1 });
        assert_eq!(started.phase, Phase::Playing);
        assert!(started.item.is_none());

        // Shrink the body; the per-tick retry finds a free cell.
        let mut thawed = started.clone();
        thawed.players[0].segments = [Position::new(0, 10)].into_iter().collect();
        thawed.players[0].score = 1;
        let next = thawed.apply(&Command::AdvanceTick);
        let item = next.item.as_ref().unwrap();
        assert!(!next.occupied_cells().contains(&item.position));
    }
}
