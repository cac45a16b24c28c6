use crate::config::HeartbeatConfig;
use crate::error::RelayError;
use crate::relay::{Liveness, Relay};
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use duet_core::{ConnectionId, SignalMessage};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{info, warn};

const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Shared state of the HTTP router.
#[derive(Clone)]
pub struct RelayState {
    pub relay: Relay,
    pub signaling: SignalingService,
    pub heartbeat: HeartbeatConfig,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RelayState) {
    let conn = ConnectionId::new();
    info!("New WebSocket connection: {}", conn);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_peer(conn, tx.clone());
    state.relay.register(conn).await;

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = state.relay.clone();
        let period = state.heartbeat.interval.max(MIN_HEARTBEAT_INTERVAL);

        async move {
            let mut heartbeat = interval_at(Instant::now() + period, period);

            loop {
                tokio::select! {
                    frame = receiver.next() => {
                        let Some(Ok(msg)) = frame else {
                            break;
                        };
                        relay.touch(&conn);

                        match msg {
                            Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                                Ok(signal) => relay.handle_signal(conn, signal).await,
                                Err(e) => {
                                    warn!("Invalid SignalMessage from {}: {}", conn, e);
                                    relay
                                        .reject(conn, RelayError::InvalidMessage(e.to_string()))
                                        .await;
                                }
                            },
                            Message::Binary(_) => {
                                let err = RelayError::InvalidMessage(
                                    "binary frames are not supported".to_owned(),
                                );
                                relay.reject(conn, err).await;
                            }
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }

                    _ = heartbeat.tick() => {
                        if relay.heartbeat_tick(&conn) == Liveness::Dead {
                            warn!("Connection {} stopped answering pings", conn);
                            break;
                        }
                        if tx.send(Message::Ping(Bytes::new())).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.relay.disconnect(conn).await;
    state.signaling.remove_peer(&conn);
    info!("WebSocket disconnected: {}", conn);
}
