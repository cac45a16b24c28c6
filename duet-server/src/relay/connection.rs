use duet_core::{ConnectionId, RoomId};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// Pings sent since the last inbound frame, still within tolerance.
    AwaitingPong { missed: u32 },
    Dead,
}

/// Relay-side record of one client connection.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub room: Option<RoomId>,
    pub name: Option<String>,
    pub connected_at: Instant,
    missed_heartbeats: u32,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            room: None,
            name: None,
            connected_at: Instant::now(),
            missed_heartbeats: 0,
        }
    }

    pub fn liveness(&self, miss_allowed: u32) -> Liveness {
        match self.missed_heartbeats {
            0 => Liveness::Alive,
            missed if missed <= miss_allowed => Liveness::AwaitingPong { missed },
            _ => Liveness::Dead,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.missed_heartbeats = 0;
    }

    pub(crate) fn miss_heartbeat(&mut self) {
        self.missed_heartbeats = self.missed_heartbeats.saturating_add(1);
    }
}
