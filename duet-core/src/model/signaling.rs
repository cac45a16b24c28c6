use crate::model::connection::ConnectionId;
use crate::model::ice::IceServerConfig;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error codes the relay reports back to the offending connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    RoomFull,
    AlreadyJoined,
    NotInRoom,
    InvalidMessage,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RoomFull => "RoomFull",
            Self::AlreadyJoined => "AlreadyJoined",
            Self::NotInRoom => "NotInRoom",
            Self::InvalidMessage => "InvalidMessage",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    pub id: ConnectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One frame of the signaling protocol.
///
/// `offer`, `answer`, `candidate` and `chat` are relayed to the other member of the
/// sender's room with `sender` stamped by the relay; `payload` is never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    Welcome {
        sender: ConnectionId,
        #[serde(default)]
        ice_servers: Vec<IceServerConfig>,
    },
    Join {
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Joined {
        room_id: RoomId,
        #[serde(default)]
        peers: Vec<PeerInfo>,
    },
    Offer {
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ConnectionId>,
    },
    Answer {
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ConnectionId>,
    },
    Candidate {
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ConnectionId>,
    },
    Leave,
    Chat {
        payload: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ConnectionId>,
        timestamp: u64,
    },
    PeerJoined {
        sender: ConnectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    PeerLeft {
        sender: ConnectionId,
    },
    Error {
        code: ErrorCode,
        #[serde(default)]
        message: String,
    },
}

impl SignalMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Wire name of the message type, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Join { .. } => "join",
            Self::Joined { .. } => "joined",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::Leave => "leave",
            Self::Chat { .. } => "chat",
            Self::PeerJoined { .. } => "peer-joined",
            Self::PeerLeft { .. } => "peer-left",
            Self::Error { .. } => "error",
        }
    }

    /// Messages a room member may ask the relay to forward.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Self::Offer { .. } | Self::Answer { .. } | Self::Candidate { .. } | Self::Chat { .. }
        )
    }

    /// Overwrite the `sender` of a relayable message. Other variants are returned as is.
    pub fn with_sender(self, id: ConnectionId) -> Self {
        match self {
            Self::Offer { payload, .. } => Self::Offer {
                payload,
                sender: Some(id),
            },
            Self::Answer { payload, .. } => Self::Answer {
                payload,
                sender: Some(id),
            },
            Self::Candidate { payload, .. } => Self::Candidate {
                payload,
                sender: Some(id),
            },
            Self::Chat {
                payload, timestamp, ..
            } => Self::Chat {
                payload,
                sender: Some(id),
                timestamp,
            },
            other => other,
        }
    }
}

/// Extract the SDP text of a session description payload.
///
/// Accepts a bare SDP string or a browser-style `{ "type": .., "sdp": .. }` object.
pub fn sdp_from_payload(payload: &Value) -> Option<&str> {
    let sdp = match payload {
        Value::String(sdp) => sdp.as_str(),
        Value::Object(map) => map.get("sdp")?.as_str()?,
        _ => return None,
    };
    if sdp.trim().is_empty() { None } else { Some(sdp) }
}
