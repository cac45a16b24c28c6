use crate::error::ClientError;
use async_trait::async_trait;
use duet_core::SignalMessage;

/// Outbound half of the relay connection as seen by a session.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ClientError>;
}
