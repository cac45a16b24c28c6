use std::fmt;

/// Client-local progress of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    AwaitingMedia,
    Offering,
    Answering,
    Connected,
    Closed,
}

impl SessionState {
    /// States in which a local description exists and candidates may flow.
    pub fn is_negotiating(&self) -> bool {
        matches!(self, Self::Offering | Self::Answering | Self::Connected)
    }

    pub fn can_start_call(&self) -> bool {
        matches!(self, Self::Idle | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingMedia => "awaiting-media",
            Self::Offering => "offering",
            Self::Answering => "answering",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
