//! Room registry and per-room tick scheduling.
//!
//! Each room runs as its own task owning the room value. Commands arrive
//! on an mpsc stream, and the tick is injected into that same stream from
//! a per-room interval, so every transition is applied by a single writer
//! in arrival order. Rooms share nothing but the registry map; a stalled
//! room cannot block another.

use crate::command::Command;
use crate::config::Config;
use crate::entity::PlayerId;
use crate::room::{Room, RoomId};
use protocol::{Grid, ServerEvent};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

/// Length of generated room identifiers.
pub const ROOM_ID_LEN: usize = 6;

/// Broadcast capacity per room; a session lagging this far behind skips
/// stale snapshots.
const ROOM_EVENT_CAPACITY: usize = 64;

/// An event published by a room task to its subscribed sessions.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Delivered to every participant of the room.
    Broadcast(ServerEvent),
    /// Delivered to a single participant; other sessions drop it.
    Targeted {
        player_id: PlayerId,
        event: ServerEvent,
    },
}

/// Cloneable handle to a live room task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub id: RoomId,
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<RoomEvent>,
}

impl RoomHandle {
    /// Queue a command onto the room's serialized stream.
    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Room {} is gone, dropping command", self.id);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }
}

/// Process-wide mapping of room id to live room handle.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
    grid: Grid,
    max_players: usize,
    tick_interval: Duration,
    linger: Duration,
}

impl RoomRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            grid: config.game.grid(),
            max_players: config.game.max_players,
            tick_interval: Duration::from_millis(config.server.tick_interval_ms),
            linger: Duration::from_secs(config.server.room_linger_secs),
        }
    }

    /// Look up a live room.
    pub async fn get(&self, id: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Create a new empty room and spawn its task. The caller seeds it
    /// with a `CreateRoom` command carrying the creating participant.
    pub async fn create_room(&self) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        let id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(ROOM_EVENT_CAPACITY);
        let handle = RoomHandle {
            id: id.clone(),
            commands: cmd_tx,
            events: event_tx.clone(),
        };
        rooms.insert(id.clone(), handle.clone());

        let room = Room::new(id.clone(), self.grid, self.max_players);
        let rooms_for_cleanup = Arc::clone(&self.rooms);
        let tick_interval = self.tick_interval;
        let linger = self.linger;
        tokio::spawn(async move {
            run_room(room, cmd_rx, event_tx, tick_interval, linger).await;
            rooms_for_cleanup.write().await.remove(&id);
            info!("Room {} removed", id);
        });

        handle
    }
}

/// Random alphanumeric room id, also used as the client-side route.
fn generate_room_id() -> RoomId {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(char::from)
        .collect()
}

/// The room actor: owns the room value until teardown.
async fn run_room(
    mut room: Room,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<RoomEvent>,
    tick_interval: Duration,
    linger: Duration,
) {
    info!("Room {} created", room.id);

    // Ticks only while the room is Playing with participants present.
    let mut ticker: Option<Interval> = None;
    // A fresh room is empty; reap it if the creator never arrives, and
    // re-arm whenever the room empties out again.
    let mut teardown: Option<Instant> = Some(Instant::now() + linger);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                room = handle_command(room, &command, &events, tick_interval, &mut ticker);
            }
            _ = async { ticker.as_mut().unwrap().tick().await }, if ticker.is_some() => {
                let started = Instant::now();
                room = room.apply(&Command::AdvanceTick);
                publish(&events, RoomEvent::Broadcast(room.game_update()));
                if !room.is_playing() || room.is_empty() {
                    ticker = None;
                }

                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                let budget_ms = tick_interval.as_secs_f64() * 1000.0 * 0.9;
                if elapsed_ms > budget_ms {
                    warn!(
                        "Slow tick #{} in room {}: {:.3}ms (budget: {:.1}ms, {} players)",
                        room.tick,
                        room.id,
                        elapsed_ms,
                        budget_ms,
                        room.players.len()
                    );
                }
            }
            _ = async { sleep_until(teardown.unwrap()).await }, if teardown.is_some() => {
                info!("Room {} empty for {:?}, tearing down", room.id, linger);
                break;
            }
        }

        if room.is_empty() {
            if teardown.is_none() {
                ticker = None;
                teardown = Some(Instant::now() + linger);
            }
        } else {
            teardown = None;
        }
    }
}

/// Apply one command and perform its side effects: membership broadcasts,
/// join rejections, and starting or stopping the tick interval.
fn handle_command(
    room: Room,
    command: &Command,
    events: &broadcast::Sender<RoomEvent>,
    tick_interval: Duration,
    ticker: &mut Option<Interval>,
) -> Room {
    let next = room.apply(command);
    match command {
        Command::CreateRoom { id, .. } | Command::JoinRoom { id, .. } => {
            if next.contains_player(*id) {
                info!(
                    "Room {}: participant {} joined ({}/{})",
                    next.id,
                    id,
                    next.players.len(),
                    next.max_players
                );
                publish(events, RoomEvent::Broadcast(next.membership_update()));
            } else {
                warn!("Room {}: rejected join from {}", next.id, id);
                publish(
                    events,
                    RoomEvent::Targeted {
                        player_id: *id,
                        event: ServerEvent::Error {
                            message: format!("unable to join room {}", next.id),
                        },
                    },
                );
            }
        }
        Command::StartGame { id } => {
            if next.is_playing() && !room.is_playing() {
                info!("Room {}: game started by participant {}", next.id, id);
                *ticker = Some(new_ticker(tick_interval));
                publish(events, RoomEvent::Broadcast(next.game_update()));
            } else if !next.is_playing() {
                debug!("Room {}: ignored start from {}", next.id, id);
            }
        }
        Command::DirectionUpdate { .. } | Command::AdvanceTick => {}
        Command::Disconnect { id } | Command::ExitGame { id } => {
            if room.contains_player(*id) {
                info!("Room {}: participant {} left", next.id, id);
                publish(events, RoomEvent::Broadcast(next.membership_update()));
            }
        }
    }

    if !next.is_playing() || next.is_empty() {
        *ticker = None;
    }
    next
}

fn new_ticker(tick_interval: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + tick_interval, tick_interval);
    // A late tick pushes the next one out instead of bursting to catch up;
    // ticks never overlap for one room.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn publish(events: &broadcast::Sender<RoomEvent>, event: RoomEvent) {
    // An error only means no session is currently subscribed.
    let _ = events.send(event);
}

