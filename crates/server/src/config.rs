//! Server configuration.

use protocol::{Grid, PLAYER_COLORS, Settings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        let config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.game.cell_size > 0 && self.game.canvas_size > 0,
            "canvas_size and cell_size must be positive"
        );
        anyhow::ensure!(
            self.game.canvas_size % self.game.cell_size == 0,
            "canvas_size ({}) must be a multiple of cell_size ({})",
            self.game.canvas_size,
            self.game.cell_size
        );
        anyhow::ensure!(self.game.max_players > 0, "max_players must be at least 1");
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            game: GameConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Server name shown to clients.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// How long an emptied room stays joinable before it is torn down.
    #[serde(default = "default_room_linger")]
    pub room_linger_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
            room_linger_secs: default_room_linger(),
        }
    }
}

fn default_port() -> u16 {
    3001
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_ip_limit() -> usize {
    16
}
fn default_name() -> String {
    "Gridsnake".to_string()
}
fn default_tick_interval() -> u64 {
    100
}
fn default_room_linger() -> u64 {
    60
}

/// Board and gameplay settings, all server-authoritative.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Board edge length in pixels; a multiple of `cell_size`.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: i32,
    /// Edge length of one cell, the fixed movement step.
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
    /// Maximum participants per room.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Player names are truncated to this many characters.
    #[serde(default = "default_max_name_length")]
    pub player_name_max_length: usize,
}

impl GameConfig {
    /// The board geometry derived from this config.
    pub fn grid(&self) -> Grid {
        Grid::new(self.canvas_size, self.cell_size)
    }

    /// The settings payload pushed to clients on `select_game`.
    pub fn settings(&self) -> Settings {
        Settings {
            canvas_size: self.canvas_size,
            cell_size: self.cell_size,
            player_colors: PLAYER_COLORS.to_vec(),
            player_name_max_length: self.player_name_max_length,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_size: default_canvas_size(),
            cell_size: default_cell_size(),
            max_players: default_max_players(),
            player_name_max_length: default_max_name_length(),
        }
    }
}

fn default_canvas_size() -> i32 {
    300
}
fn default_cell_size() -> i32 {
    10
}
fn default_max_players() -> usize {
    4
}
fn default_max_name_length() -> usize {
    12
}
