//! Game server implementation.
//!
//! Accepts WebSocket connections and maps each to a session task that
//! translates inbound events into room commands and fans room events back
//! out to the socket. All game state lives in the room tasks; a session
//! holds nothing but its identity and a room handle.

use crate::command::Command;
use crate::config::Config;
use crate::registry::{RoomEvent, RoomRegistry};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientEvent, Phase, ServerEvent, decode_client, encode_server, parse_key};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod session;

use session::Session;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }
        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    let registry = RoomRegistry::new(&config);
    let config = Arc::new(config);
    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let next_session_id = AtomicU32::new(1);

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, config.server.max_connections, config.server.ip_limit)
            {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
        let registry = registry.clone();
        let config = Arc::clone(&config);
        let conn_state = Arc::clone(&conn_state);

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, session_id, registry, config).await;

            conn_state.write().await.remove_connection(ip);

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session_id: u32,
    registry: RoomRegistry,
    config: Arc<Config>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("Session {} connected from {}", session_id, addr);

    let (mut write, mut read) = ws_stream.split();
    let mut session = Session::new(session_id, addr);
    let mut room_rx: Option<broadcast::Receiver<RoomEvent>> = None;

    loop {
        tokio::select! {
            // Inbound client events.
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match decode_client(&text) {
                        Ok(event) => {
                            handle_client_event(event, &mut session, &mut room_rx, &mut write, &registry, &config).await?;
                        }
                        Err(e) => {
                            warn!("Session {} sent undecodable event: {}", session.id, e);
                            send_event(&mut write, &ServerEvent::Error { message: e.to_string() }).await?;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error from {}: {}", addr, e);
                    break;
                }
                None => {
                    break;
                }
            },
            // Events from the joined room, if any.
            event = async { room_rx.as_mut().unwrap().recv().await }, if room_rx.is_some() => {
                match event {
                    Ok(RoomEvent::Broadcast(event)) => {
                        send_event(&mut write, &event).await?;
                    }
                    Ok(RoomEvent::Targeted { player_id, event }) => {
                        if player_id == session.id {
                            send_event(&mut write, &event).await?;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session {} lagged, skipped {} room events", session.id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    // Transport-level disconnect removes the participant from its room.
    if let Some(room) = session.room.take() {
        room.send(Command::Disconnect { id: session.id });
    }
    info!("Session {} ({}) disconnected", session_id, addr);

    Ok(())
}

/// Translate one inbound event into registry lookups, room commands, and
/// direct replies. Invalid input never mutates game state; the sender
/// alone gets a diagnostic.
async fn handle_client_event(
    event: ClientEvent,
    session: &mut Session,
    room_rx: &mut Option<broadcast::Receiver<RoomEvent>>,
    write: &mut WsSink,
    registry: &RoomRegistry,
    config: &Config,
) -> anyhow::Result<()> {
    match event {
        ClientEvent::Initialize { room_id } => {
            // Echo the room id back only if that room is still alive.
            let room_id = match room_id {
                Some(id) => registry.get(&id).await.map(|handle| handle.id),
                None => None,
            };
            send_event(
                write,
                &ServerEvent::SelectGame {
                    state: Phase::Select,
                    room_id,
                    settings: config.game.settings(),
                },
            )
            .await?;
        }
        ClientEvent::CreateRoom { color, name } => {
            if session.room.is_some() {
                send_event(write, &error_event("already in a room")).await?;
                return Ok(());
            }
            let handle = registry.create_room().await;
            *room_rx = Some(handle.subscribe());
            handle.send(Command::CreateRoom {
                id: session.id,
                name: clean_name(&name, config),
                color,
            });
            session.room = Some(handle);
        }
        ClientEvent::JoinRoom {
            room_id,
            color,
            name,
        } => {
            if session.room.is_some() {
                send_event(write, &error_event("already in a room")).await?;
                return Ok(());
            }
            match registry.get(&room_id).await {
                Some(handle) => {
                    *room_rx = Some(handle.subscribe());
                    handle.send(Command::JoinRoom {
                        id: session.id,
                        name: clean_name(&name, config),
                        color,
                    });
                    session.room = Some(handle);
                }
                None => {
                    warn!(
                        "Session {} tried to join nonexistent room {}",
                        session.id, room_id
                    );
                    send_event(write, &error_event(&format!("room {room_id} does not exist")))
                        .await?;
                }
            }
        }
        ClientEvent::StartGame { player_id } => {
            let id = session.verify_player_id(player_id);
            match &session.room {
                Some(room) => room.send(Command::StartGame { id }),
                None => send_event(write, &error_event("not in a room")).await?,
            }
        }
        ClientEvent::DirectionUpdate { player_id, key } => {
            let id = session.verify_player_id(player_id);
            match parse_key(&key) {
                Ok(direction) => {
                    if let Some(room) = &session.room {
                        room.send(Command::DirectionUpdate { id, direction });
                    } else {
                        debug!("Session {} steered outside a room", session.id);
                    }
                }
                Err(e) => {
                    warn!("Session {}: {}", session.id, e);
                    send_event(write, &error_event(&e.to_string())).await?;
                }
            }
        }
        ClientEvent::ExitGame => {
            if let Some(room) = session.room.take() {
                room.send(Command::ExitGame { id: session.id });
            }
            *room_rx = None;
            // The leaving client lands back on the select screen.
            send_event(
                write,
                &ServerEvent::SelectGame {
                    state: Phase::Select,
                    room_id: None,
                    settings: config.game.settings(),
                },
            )
            .await?;
        }
    }
    Ok(())
}

fn clean_name(name: &str, config: &Config) -> String {
    name.trim()
        .chars()
        .take(config.game.player_name_max_length)
        .collect()
}

fn error_event(message: &str) -> ServerEvent {
    ServerEvent::Error {
        message: message.to_string(),
    }
}

async fn send_event(write: &mut WsSink, event: &ServerEvent) -> anyhow::Result<()> {
    let text = encode_server(event)?;
    write.send(Message::Text(text.into())).await?;
    Ok(())
}
