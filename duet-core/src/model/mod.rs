mod connection;
mod ice;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use ice::IceServerConfig;
pub use room::{MAX_ROOM_ID_LEN, RoomId};
pub use signaling::{ErrorCode, PeerInfo, SignalMessage, sdp_from_payload};
