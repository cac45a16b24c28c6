use crate::error::RelayError;
use duet_core::{ConnectionId, RoomId};

/// A capacity-bounded group of connections that exchange signaling with each other.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    /// Join order is kept so `joined` lists peers the way they arrived.
    members: Vec<ConnectionId>,
    capacity: usize,
}

impl Room {
    pub fn new(id: RoomId, capacity: usize) -> Self {
        Self {
            id,
            members: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn contains(&self, conn: &ConnectionId) -> bool {
        self.members.contains(conn)
    }

    /// Every member except `conn`.
    pub fn others(&self, conn: &ConnectionId) -> Vec<ConnectionId> {
        self.members.iter().filter(|m| *m != conn).copied().collect()
    }

    pub(crate) fn admit(&mut self, conn: ConnectionId) -> Result<(), RelayError> {
        if self.contains(&conn) {
            return Err(RelayError::AlreadyJoined(self.id.clone()));
        }
        if self.is_full() {
            return Err(RelayError::RoomFull(self.id.clone()));
        }
        self.members.push(conn);
        Ok(())
    }

    pub(crate) fn remove(&mut self, conn: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != conn);
        self.members.len() != before
    }
}
