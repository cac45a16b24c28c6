use duet_core::{ErrorCode, RoomId};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Protocol violations. Reported to the offending connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("already a member of room {0}")]
    AlreadyJoined(RoomId),

    #[error("not a member of any room")]
    NotInRoom,

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl RelayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::AlreadyJoined(_) => ErrorCode::AlreadyJoined,
            Self::NotInRoom => ErrorCode::NotInRoom,
            Self::InvalidMessage(_) => ErrorCode::InvalidMessage,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server stopped with an error: {0}")]
    Serve(#[from] io::Error),

    #[error("server task panicked or was cancelled")]
    Join(#[from] tokio::task::JoinError),
}
