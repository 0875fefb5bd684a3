//! Toroidal grid geometry.
//!
//! Positions are cell-aligned integer pairs; movement happens in whole-cell
//! steps and wraps at the board edges.

use serde::{Deserialize, Serialize};

/// A cell-aligned position on the board, in the range `[0, canvas_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Movement direction of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The 180-degree opposite of this direction.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// True if `requested` points straight back into this direction.
    pub fn is_reversal_of(self, requested: Direction) -> bool {
        self.opposite() == requested
    }
}

/// Board dimensions. `canvas_size` is a multiple of `cell_size` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub canvas_size: i32,
    pub cell_size: i32,
}

impl Grid {
    pub const fn new(canvas_size: i32, cell_size: i32) -> Self {
        Self {
            canvas_size,
            cell_size,
        }
    }

    /// Number of cells along one axis.
    pub const fn cells_per_axis(&self) -> i32 {
        self.canvas_size / self.cell_size
    }

    /// Move one cell step in `direction`, wrapping at the board edges.
    pub fn advance(&self, position: Position, direction: Direction) -> Position {
        self.wrap(step(position, direction, self.cell_size))
    }

    /// Map an out-of-range coordinate back onto the board: anything below
    /// zero lands on the last cell, anything at or past the edge lands on
    /// the first.
    pub fn wrap(&self, position: Position) -> Position {
        Position {
            x: self.wrap_axis(position.x),
            y: self.wrap_axis(position.y),
        }
    }

    fn wrap_axis(&self, value: i32) -> i32 {
        if value < 0 {
            self.canvas_size - self.cell_size
        } else if value >= self.canvas_size {
            0
        } else {
            value
        }
    }
}

/// Apply one fixed-size step in `direction`, without wrapping.
pub fn step(position: Position, direction: Direction, step: i32) -> Position {
    match direction {
        Direction::Up => Position::new(position.x, position.y - step),
        Direction::Down => Position::new(position.x, position.y + step),
        Direction::Left => Position::new(position.x - step, position.y),
        Direction::Right => Position::new(position.x + step, position.y),
    }
}
