use crate::session::SessionState;
use duet_core::ErrorCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    #[error("relay connection dropped")]
    TransportDropped,

    #[error("relay unreachable: {0}")]
    RelayUnreachable(String),

    #[error("relay rejected request ({code}): {message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
}
