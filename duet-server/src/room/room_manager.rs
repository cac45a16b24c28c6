use crate::error::RelayError;
use crate::room::Room;
use dashmap::DashMap;
use duet_core::{ConnectionId, RoomId};
use std::sync::Arc;
use tracing::info;

/// Index of live rooms keyed by room id.
///
/// Every mutation of a room happens while holding that room's map entry, so the
/// capacity check and the insert of a join are a single step.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    capacity: usize,
}

impl RoomManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Add `conn` to `room_id`, creating the room if needed.
    ///
    /// Returns the members that were already present.
    pub fn join(&self, room_id: &RoomId, conn: ConnectionId) -> Result<Vec<ConnectionId>, RelayError> {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), self.capacity)
        });

        room.admit(conn)?;
        Ok(room.others(&conn))
    }

    /// Remove `conn` from `room_id`, destroying the room once it is empty.
    ///
    /// Returns the remaining members, or `None` if `conn` was not in that room.
    pub fn leave(&self, room_id: &RoomId, conn: &ConnectionId) -> Option<Vec<ConnectionId>> {
        let remaining = {
            let mut room = self.rooms.get_mut(room_id)?;
            if !room.remove(conn) {
                return None;
            }
            room.members().to_vec()
        };

        if remaining.is_empty()
            && self
                .rooms
                .remove_if(room_id, |_, room| room.is_empty())
                .is_some()
        {
            info!("Room {} is empty, destroyed", room_id);
        }

        Some(remaining)
    }

    pub fn members(&self, room_id: &RoomId) -> Option<Vec<ConnectionId>> {
        self.rooms.get(room_id).map(|room| room.members().to_vec())
    }

    /// Members of `room_id` other than `conn`; empty if the room does not exist.
    pub fn others(&self, room_id: &RoomId, conn: &ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.others(conn))
            .unwrap_or_default()
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
