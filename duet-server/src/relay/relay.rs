use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::{Connection, Liveness};
use crate::room::RoomManager;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use duet_core::{ConnectionId, IceServerConfig, PeerInfo, RoomId, SignalMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct RelayInner {
    connections: DashMap<ConnectionId, Connection>,
    rooms: RoomManager,
    output: Arc<dyn SignalingOutput>,
    ice_servers: Vec<IceServerConfig>,
    miss_allowed: u32,
}

/// Routes signaling between the members of a room and nobody else.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Relay {
    pub fn new(config: &RelayConfig, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                connections: DashMap::new(),
                rooms: RoomManager::new(config.room_capacity),
                output,
                ice_servers: config.ice_servers.clone(),
                miss_allowed: config.heartbeat.miss_allowed,
            }),
        }
    }

    /// Record a freshly accepted connection and greet it with its id.
    pub async fn register(&self, conn: ConnectionId) {
        self.inner.connections.insert(conn, Connection::new(conn));
        info!("Connection {} registered", conn);

        let welcome = SignalMessage::Welcome {
            sender: conn,
            ice_servers: self.inner.ice_servers.clone(),
        };
        self.send(&conn, welcome).await;
    }

    /// Apply one client message. Failures go back to `conn` as an `error` frame.
    pub async fn handle_signal(&self, conn: ConnectionId, msg: SignalMessage) {
        debug!("<- {} {}", conn, msg.kind());

        let result = match msg {
            SignalMessage::Join { room_id, name } => self.join(conn, room_id, name).await,
            SignalMessage::Leave => self.leave(conn).await,
            msg if msg.is_relayable() => self.relay(conn, msg).await.map(|_| ()),
            other => Err(RelayError::InvalidMessage(format!(
                "'{}' cannot be sent by a client",
                other.kind()
            ))),
        };

        if let Err(e) = result {
            self.reject(conn, e).await;
        }
    }

    pub async fn reject(&self, conn: ConnectionId, err: RelayError) {
        warn!("Rejecting request from {}: {}", conn, err);
        self.send(&conn, SignalMessage::error(err.code(), err.to_string()))
            .await;
    }

    pub async fn join(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        name: Option<String>,
    ) -> Result<(), RelayError> {
        if !room_id.is_valid() {
            return Err(RelayError::InvalidMessage(
                "room id must be a non-blank token of at most 64 bytes".to_owned(),
            ));
        }

        let current = self
            .inner
            .connections
            .get(&conn)
            .map(|record| record.room.clone())
            .ok_or_else(|| RelayError::InvalidMessage("unknown connection".to_owned()))?;
        if let Some(existing) = current {
            return Err(RelayError::AlreadyJoined(existing));
        }

        let name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        let others = self.inner.rooms.join(&room_id, conn)?;

        if let Some(mut record) = self.inner.connections.get_mut(&conn) {
            record.room = Some(room_id.clone());
            record.name = name.clone();
        }
        info!(
            "Connection {} joined room {} ({} member(s))",
            conn,
            room_id,
            others.len() + 1
        );

        let peers = others
            .iter()
            .map(|id| PeerInfo {
                id: *id,
                name: self.name_of(id),
            })
            .collect();
        self.send(&conn, SignalMessage::Joined { room_id, peers })
            .await;

        for other in others {
            let notice = SignalMessage::PeerJoined {
                sender: conn,
                name: name.clone(),
            };
            self.send(&other, notice).await;
        }

        Ok(())
    }

    /// Forward `msg` to the other members of the sender's room.
    ///
    /// Returns how many connections it was handed to; zero is not an error.
    pub async fn relay(&self, conn: ConnectionId, msg: SignalMessage) -> Result<usize, RelayError> {
        let room_id = self.room_of(&conn).ok_or(RelayError::NotInRoom)?;
        let recipients = self.inner.rooms.others(&room_id, &conn);
        let msg = msg.with_sender(conn);

        debug!(
            "Relaying {} from {} to {} recipient(s) in {}",
            msg.kind(),
            conn,
            recipients.len(),
            room_id
        );
        for to in &recipients {
            self.send(to, msg.clone()).await;
        }

        Ok(recipients.len())
    }

    pub async fn leave(&self, conn: ConnectionId) -> Result<(), RelayError> {
        let room_id = {
            let mut record = self
                .inner
                .connections
                .get_mut(&conn)
                .ok_or(RelayError::NotInRoom)?;
            record.room.take().ok_or(RelayError::NotInRoom)?
        };

        self.depart(conn, &room_id).await;
        Ok(())
    }

    /// Transport went away: implicit leave, then forget the connection.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let Some((_, record)) = self.inner.connections.remove(&conn) else {
            return;
        };

        if let Some(room_id) = record.room {
            self.depart(conn, &room_id).await;
        }
        info!(
            "Connection {} closed after {:?}",
            conn,
            record.connected_at.elapsed()
        );
    }

    /// Any inbound frame proves the connection is alive.
    pub fn touch(&self, conn: &ConnectionId) {
        if let Some(mut record) = self.inner.connections.get_mut(conn) {
            record.touch();
        }
    }

    /// Count one more unanswered heartbeat.
    pub fn heartbeat_tick(&self, conn: &ConnectionId) -> Liveness {
        let Some(mut record) = self.inner.connections.get_mut(conn) else {
            return Liveness::Dead;
        };
        record.miss_heartbeat();
        record.liveness(self.inner.miss_allowed)
    }

    pub fn room_of(&self, conn: &ConnectionId) -> Option<RoomId> {
        self.inner
            .connections
            .get(conn)
            .and_then(|record| record.room.clone())
    }

    pub fn room_members(&self, room_id: &RoomId) -> Option<Vec<ConnectionId>> {
        self.inner.rooms.members(room_id)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.room_count()
    }

    async fn depart(&self, conn: ConnectionId, room_id: &RoomId) {
        let Some(remaining) = self.inner.rooms.leave(room_id, &conn) else {
            warn!("Connection {} was not listed in room {}", conn, room_id);
            return;
        };
        info!("Connection {} left room {}", conn, room_id);

        for other in remaining {
            self.send(&other, SignalMessage::PeerLeft { sender: conn })
                .await;
        }
    }

    fn name_of(&self, conn: &ConnectionId) -> Option<String> {
        self.inner
            .connections
            .get(conn)
            .and_then(|record| record.name.clone())
    }

    async fn send(&self, to: &ConnectionId, msg: SignalMessage) {
        self.inner.output.send_signal(to, msg).await;
    }
}
