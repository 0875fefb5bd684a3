//! Consumable item (the fruit).

use protocol::{Color, Grid, ItemSnapshot, PLAYER_COLORS, Position};
use rand::Rng;
use std::collections::HashSet;

/// Random placement attempts before falling back to a deterministic scan.
pub const ITEM_SPAWN_RETRIES: u32 = 32;

/// Item size in cells.
pub const ITEM_SIZE: i32 = 1;

/// The consumable object that grows an entity and increments its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub color: Color,
    pub size: i32,
    pub position: Position,
}

impl Item {
    /// Place a new item on a free cell.
    ///
    /// Rejection-samples up to [`ITEM_SPAWN_RETRIES`] random cells, then
    /// scans the board row-major for the first free cell. Returns `None`
    /// only when every cell is occupied; callers retry on a later tick.
    pub fn spawn(grid: &Grid, occupied: &HashSet<Position>) -> Option<Self> {
        let mut rng = rand::rng();
        let cells = grid.cells_per_axis();

        for _ in 0..ITEM_SPAWN_RETRIES {
            let position = Position::new(
                rng.random_range(0..cells) * grid.cell_size,
                rng.random_range(0..cells) * grid.cell_size,
            );
            if !occupied.contains(&position) {
                return Some(Self::at(position, &mut rng));
            }
        }

        for y in 0..cells {
            for x in 0..cells {
                let position = Position::new(x * grid.cell_size, y * grid.cell_size);
                if !occupied.contains(&position) {
                    return Some(Self::at(position, &mut rng));
                }
            }
        }

        None
    }

    fn at(position: Position, rng: &mut impl Rng) -> Self {
        Self {
            color: PLAYER_COLORS[rng.random_range(0..PLAYER_COLORS.len())],
            size: ITEM_SIZE,
            position,
        }
    }

    /// Wire view of this item.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            color: self.color,
            size: self.size,
            position: self.position,
        }
    }
}
