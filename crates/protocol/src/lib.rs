//! Shared protocol crate for gridsnake.
//!
//! This crate contains:
//! - Toroidal grid geometry shared by server and clients
//! - Event definitions and the JSON wire codec
//! - Shared types (Color, Phase, snapshots)

mod error;
pub mod events;
pub mod grid;

pub use error::ProtocolError;
pub use events::{
    ClientEvent, ItemSnapshot, PlayerSnapshot, ServerEvent, Settings, decode_client,
    encode_server, parse_key,
};
pub use grid::{Direction, Grid, Position};

use serde::{Deserialize, Serialize};

/// Named palette color used for players and items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Green,
    Blue,
    Red,
    Orange,
    Purple,
    Yellow,
}

/// The colors a player may pick from on the select screen.
pub const PLAYER_COLORS: [Color; 6] = [
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::Orange,
    Color::Purple,
    Color::Yellow,
];

/// Room lifecycle phase, as surfaced to clients in every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Select,
    WaitingRoom,
    Playing,
    Loading,
    Error,
}
