use crate::chat::ChatEntry;
use crate::error::ClientError;
use crate::media::RemoteTrack;
use crate::session::SessionState;
use duet_core::{ConnectionId, PeerInfo, RoomId};

/// Everything a client application reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    Error(ClientError),
    /// A remote offer is waiting for `start_call`.
    IncomingOffer { from: Option<ConnectionId> },
    Joined {
        room_id: RoomId,
        peers: Vec<PeerInfo>,
    },
    PeerJoined(PeerInfo),
    PeerLeft(ConnectionId),
    Chat(ChatEntry),
    /// The peer's audio or video arrived.
    RemoteTrack(RemoteTrack),
}
