//! Movement and collision engine.
//!
//! Advances one entity by one tick step: new head via toroidal geometry,
//! item consumption, body shift, and the self-collision check. Item
//! regeneration and entity resets are resolved by the room reducer, which
//! sees all entities.

use crate::entity::{Item, Player};
use protocol::Grid;

/// What happened to one player during one tick step.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// The new head landed on the item.
    pub consumed: bool,
    /// The new head landed on one of the player's own segments.
    pub collided: bool,
}

/// Advance `player` by one cell step.
///
/// The collision check runs against the segments as they stood when the
/// head moved: the tail cell still counts even though the shift is about
/// to vacate it, so chasing your own tail is fatal. On consumption the
/// previous head is appended and the body grows by one; otherwise the
/// oldest segment is dropped and the body length is unchanged (an empty
/// body stays empty).
pub fn step_player(player: &mut Player, item: Option<&Item>, grid: &Grid) -> StepOutcome {
    let previous_head = player.position;
    let new_head = grid.advance(previous_head, player.direction);

    let consumed = item.is_some_and(|item| item.position == new_head);
    let collided = player.segments.contains(&new_head);

    if consumed {
        player.segments.push_back(previous_head);
        player.score += 1;
    } else if !player.segments.is_empty() {
        player.segments.pop_front();
        player.segments.push_back(previous_head);
    }
    player.position = new_head;

    StepOutcome { consumed, collided }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Color, Direction, Position};

    const GRID: Grid = Grid::new(300, 10);

    fn player_at(position: Position, direction: Direction) -> Player {
        let mut player = Player::spawn(1, "test".into(), Color::Green, 0, &GRID);
        player.position = position;
        player.direction = direction;
        player
    }

    fn item_at(x: i32, y: i32) -> Item {
        Item {
            color: Color::Red,
            size: 1,
            position: Position::new(x, y),
        }
    }

    #[test]
    fn plain_move_keeps_body_length() {
        let mut player = player_at(Position::new(20, 0), Direction::Right);
        player.segments.push_back(Position::new(0, 0));
        player.segments.push_back(Position::new(10, 0));
        player.score = 2;

        let outcome = step_player(&mut player, None, &GRID);

        assert!(!outcome.consumed);
        assert!(!outcome.collided);
        assert_eq!(player.position, Position::new(30, 0));
        assert_eq!(
            player.segments,
            [Position::new(10, 0), Position::new(20, 0)]
        );
        assert_eq!(player.segments.len(), player.score as usize);
    }

    #[test]
    fn empty_body_stays_empty_without_consumption() {
        let mut player = player_at(Position::new(0, 0), Direction::Right);
        let outcome = step_player(&mut player, None, &GRID);
        assert!(!outcome.consumed);
        assert!(player.segments.is_empty());
        assert_eq!(player.score, 0);
    }

    #[test]
    fn consumption_grows_body_by_one() {
        // Head at (0,0) heading Right, item at (10,0): one tick consumes.
        let mut player = player_at(Position::new(0, 0), Direction::Right);
        let item = item_at(10, 0);

        let outcome = step_player(&mut player, Some(&item), &GRID);

        assert!(outcome.consumed);
        assert!(!outcome.collided);
        assert_eq!(player.position, Position::new(10, 0));
        assert_eq!(player.score, 1);
        assert_eq!(player.segments, [Position::new(0, 0)]);
    }

    #[test]
    fn wraps_across_the_right_edge() {
        let mut player = player_at(Position::new(290, 50), Direction::Right);
        step_player(&mut player, None, &GRID);
        assert_eq!(player.position, Position::new(0, 50));
    }

    #[test]
    fn tail_chase_is_a_collision() {
        // Body [(0,0)], head (10,0), heading Left: the new head lands on
        // the tail cell before it is vacated.
        let mut player = player_at(Position::new(10, 0), Direction::Left);
        player.segments.push_back(Position::new(0, 0));
        player.score = 1;

        let outcome = step_player(&mut player, None, &GRID);

        assert!(outcome.collided);
    }

    #[test]
    fn invariant_holds_across_many_steps() {
        let mut player = player_at(Position::new(0, 100), Direction::Right);
        for i in 0..40 {
            let item = (i % 3 == 0).then(|| {
                let ahead = GRID.advance(player.position, player.direction);
                item_at(ahead.x, ahead.y)
            });
            step_player(&mut player, item.as_ref(), &GRID);
            assert_eq!(player.segments.len(), player.score as usize);
        }
        assert!(player.score > 0);
    }
}
