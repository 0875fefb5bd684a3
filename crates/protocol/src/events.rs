//! Event definitions and the JSON wire codec.
//!
//! Events travel as WebSocket text frames shaped like
//! `{"event": "direction_update", "data": {...}}`, mirroring the
//! socket.io-style contract the web client speaks. Payload fields are
//! camelCase on the wire.

use crate::grid::{Direction, Position};
use crate::{Color, Phase, ProtocolError};
use serde::{Deserialize, Serialize};

/// Server-authoritative constants pushed to clients on `select_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub canvas_size: i32,
    pub cell_size: i32,
    pub player_colors: Vec<Color>,
    pub player_name_max_length: usize,
}

/// Wire view of one player: head, trailing segments (oldest first), and score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub position: Position,
    pub positions: Vec<Position>,
    pub direction: Direction,
    pub score: u32,
}

/// Wire view of the consumable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub color: Color,
    pub size: i32,
    pub position: Position,
}

/// Events sent by clients. Unknown event names fail to decode and are
/// dropped by the server with a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// First message after connect; echoes a room id when rejoining.
    Initialize {
        #[serde(default)]
        room_id: Option<String>,
    },
    CreateRoom {
        color: Color,
        name: String,
    },
    JoinRoom {
        room_id: String,
        color: Color,
        name: String,
    },
    StartGame {
        player_id: u32,
    },
    DirectionUpdate {
        player_id: u32,
        key: String,
    },
    ExitGame,
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Handshake reply carrying the authoritative game settings.
    SelectGame {
        state: Phase,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        settings: Settings,
    },
    /// Room membership update, sent to the whole room on create and join.
    CreateRoomAck {
        state: Phase,
        room_id: String,
        players: Vec<PlayerSnapshot>,
    },
    /// Per-tick state snapshot.
    GameUpdate {
        state: Phase,
        players: Vec<PlayerSnapshot>,
        fruit: Option<ItemSnapshot>,
    },
    /// Diagnostic sent only to the offending client.
    Error {
        message: String,
    },
}

/// Decode one inbound text frame.
pub fn decode_client(text: &str) -> Result<ClientEvent, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode one outbound event as a text frame.
pub fn encode_server(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

/// Map a keyboard key to a direction. Arrow keys and WASD are accepted,
/// character keys case-insensitively; anything else is rejected.
pub fn parse_key(key: &str) -> Result<Direction, ProtocolError> {
    match key.to_ascii_uppercase().as_str() {
        "ARROWUP" | "W" => Ok(Direction::Up),
        "ARROWDOWN" | "S" => Ok(Direction::Down),
        "ARROWLEFT" | "A" => Ok(Direction::Left),
        "ARROWRIGHT" | "D" => Ok(Direction::Right),
        _ => Err(ProtocolError::UnknownKey(key.to_string())),
    }
}
