//! Game entities.
//!
//! This module defines the participant-controlled snake and the
//! consumable item, together with their placement factories.

mod item;
mod player;

pub use item::{ITEM_SIZE, ITEM_SPAWN_RETRIES, Item};
pub use player::{Player, PlayerId};
