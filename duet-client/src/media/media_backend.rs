use anyhow::Result;
use async_trait::async_trait;
use duet_core::IceServerConfig;
use serde_json::Value;

/// A track the peer started sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    /// `audio` or `video`.
    pub kind: String,
    pub mime_type: String,
}

/// What the media layer reports back to the session, asynchronously.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Trickle ICE: a local candidate, already in its JSON wire form.
    LocalCandidate(Value),
    RemoteTrack(RemoteTrack),
    Connected,
    Failed,
    Disconnected,
}

/// Local media plus the peer connection carrying it.
///
/// Implementations push [`MediaEvent`]s through a channel handed out at construction.
#[async_trait]
pub trait MediaBackend: Send + Sync + 'static {
    /// ICE servers announced by the relay. Applies to peer connections created afterwards.
    async fn set_ice_servers(&self, _servers: Vec<IceServerConfig>) {}

    async fn acquire_local_media(&self) -> Result<()>;

    /// Create and apply a local offer; returns its SDP.
    async fn create_offer(&self) -> Result<String>;

    /// Apply a remote offer, then create and apply the answer; returns the answer SDP.
    async fn accept_offer(&self, sdp: &str) -> Result<String>;

    async fn apply_answer(&self, sdp: &str) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: Value) -> Result<()>;

    /// Drop the current negotiation but keep local media.
    async fn reset(&self) -> Result<()>;

    /// Release local media and the peer connection.
    async fn close(&self) -> Result<()>;
}
