use crate::error::ClientError;
use crate::session::SignalSink;
use async_trait::async_trait;
use duet_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

/// Outbound side of a relay connection. Cheap to clone.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<Message>,
}

impl RelaySender {
    pub fn send(&self, msg: &SignalMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(msg)
            .map_err(|e| ClientError::NegotiationFailed(e.to_string()))?;
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| ClientError::TransportDropped)
    }
}

#[async_trait]
impl SignalSink for RelaySender {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ClientError> {
        self.send(&msg)
    }
}

pub struct RelayConnection;

impl RelayConnection {
    /// Open the WebSocket to the relay.
    ///
    /// The returned stream ends when the connection drops.
    pub async fn connect(
        url: &str,
    ) -> Result<(RelaySender, mpsc::UnboundedReceiver<SignalMessage>), ClientError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::RelayUnreachable(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut write, mut read) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(msg) => {
                            debug!("<- relay {}", msg.kind());
                            if in_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid SignalMessage from relay: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay connection error: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok((RelaySender { tx: out_tx }, in_rx))
    }
}
