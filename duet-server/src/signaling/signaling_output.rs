use async_trait::async_trait;
use duet_core::{ConnectionId, SignalMessage};

/// Outbound side of the relay: how a message reaches one connected client.
///
/// Delivery is fire-and-forget. A slow or vanished recipient must not block the caller.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, to: &ConnectionId, msg: SignalMessage);
}
