use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Per-connection outbound queues of the WebSocket endpoint.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, conn: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(conn, tx);
    }

    /// Drops the queue, discarding anything still waiting to be written.
    pub fn remove_peer(&self, conn: &ConnectionId) {
        self.inner.peers.remove(conn);
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn push(&self, conn: &ConnectionId, msg: &SignalMessage) {
        let Some(peer) = self.inner.peers.get(conn) else {
            warn!("Attempted to send {} to disconnected connection {}", msg.kind(), conn);
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                debug!("-> {} {}", conn, msg.kind());
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to queue WS message to {}: {:?}", conn, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_signal(&self, to: &ConnectionId, msg: SignalMessage) {
        self.push(to, &msg);
    }
}
