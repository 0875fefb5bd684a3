//! Per-connection session state.

use crate::entity::PlayerId;
use crate::registry::RoomHandle;
use std::net::SocketAddr;
use tracing::debug;

/// A connected client session. The session id doubles as the player id in
/// whichever room the session joins.
#[derive(Debug)]
pub struct Session {
    /// Unique session ID, assigned at accept time.
    pub id: PlayerId,
    /// Remote address.
    pub addr: SocketAddr,
    /// The room this session currently participates in, if any.
    pub room: Option<RoomHandle>,
}

impl Session {
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            room: None,
        }
    }

    /// The server only ever trusts the session's own id; a payload
    /// claiming someone else's id is logged and overridden.
    pub fn verify_player_id(&self, claimed: PlayerId) -> PlayerId {
        if claimed != self.id {
            debug!(
                "Session {} claimed player id {}, using session id",
                self.id, claimed
            );
        }
        self.id
    }
}
