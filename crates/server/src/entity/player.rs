//! Player entity (a participant-controlled snake).

use protocol::{Color, Direction, Grid, PlayerSnapshot, Position};
use std::collections::VecDeque;

/// Stable per-connection identifier.
pub type PlayerId = u32;

/// A participant-controlled moving body: a head plus trailing segments.
///
/// Segments are head-exclusive and ordered oldest first, so the front of
/// the deque is the tail cell and the back is the neck. The segment count
/// always equals the score.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    pub position: Position,
    pub segments: VecDeque<Position>,
    pub direction: Direction,
    pub score: u32,
    /// Where this player (re)spawns; fixed at join time.
    spawn: Position,
}

impl Player {
    /// Spawn a fresh player on its join-order slot: distinct rows along the
    /// left edge, facing right, no body, score zero.
    pub fn spawn(id: PlayerId, name: String, color: Color, slot: usize, grid: &Grid) -> Self {
        let spawn = spawn_position(slot, grid);
        Self {
            id,
            name,
            color,
            position: spawn,
            segments: VecDeque::new(),
            direction: Direction::Right,
            score: 0,
            spawn,
        }
    }

    /// A fresh body with the same identity, used after a self-collision.
    pub fn reset(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            position: self.spawn,
            segments: VecDeque::new(),
            direction: Direction::Right,
            score: 0,
            spawn: self.spawn,
        }
    }

    /// Apply a direction update, rejecting an exact reversal into the neck.
    /// Returns whether the stored direction changed.
    pub fn steer(&mut self, requested: Direction) -> bool {
        if self.direction.is_reversal_of(requested) || self.direction == requested {
            return false;
        }
        self.direction = requested;
        true
    }

    /// Every cell this player occupies: head first, then trailing segments.
    pub fn occupied(&self) -> impl Iterator<Item = Position> + '_ {
        std::iter::once(self.position).chain(self.segments.iter().copied())
    }

    /// Wire view of this player.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            position: self.position,
            positions: self.segments.iter().copied().collect(),
            direction: self.direction,
            score: self.score,
        }
    }
}

/// Join-order spawn slots: every second row along the left edge, wrapping
/// on boards smaller than the slot count.
fn spawn_position(slot: usize, grid: &Grid) -> Position {
    let row = (slot as i32 * 2) % grid.cells_per_axis();
    Position::new(0, row * grid.cell_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: Grid = Grid::new(300, 10);

    #[test]
    fn spawns_on_distinct_rows() {
        let a = Player::spawn(1, "a".into(), Color::Green, 0, &GRID);
        let b = Player::spawn(2, "b".into(), Color::Blue, 1, &GRID);
        assert_eq!(a.position, Position::new(0, 0));
        assert_eq!(b.position, Position::new(0, 20));
        assert_eq!(a.score, 0);
        assert!(a.segments.is_empty());
        assert_eq!(a.direction, Direction::Right);
    }

    #[test]
    fn steer_rejects_reversal() {
        let mut player = Player::spawn(1, "a".into(), Color::Green, 0, &GRID);
        assert!(!player.steer(Direction::Left));
        assert_eq!(player.direction, Direction::Right);
        assert!(player.steer(Direction::Up));
        assert_eq!(player.direction, Direction::Up);
    }

    #[test]
    fn steer_is_idempotent() {
        let mut player = Player::spawn(1, "a".into(), Color::Green, 0, &GRID);
        player.steer(Direction::Up);
        assert!(!player.steer(Direction::Up));
        assert_eq!(player.direction, Direction::Up);
    }

    #[test]
    fn reset_keeps_identity_and_spawn() {
        let mut player = Player::spawn(3, "ada".into(), Color::Red, 1, &GRID);
        player.position = Position::new(100, 100);
        player.segments.push_back(Position::new(90, 100));
        player.score = 1;
        let fresh = player.reset();
        assert_eq!(fresh.id, 3);
        assert_eq!(fresh.name, "ada");
        assert_eq!(fresh.position, Position::new(0, 20));
        assert_eq!(fresh.score, 0);
        assert!(fresh.segments.is_empty());
    }
}
