use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest room token the relay accepts, in bytes.
pub const MAX_ROOM_ID_LEN: usize = 64;

const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const GENERATED_ROOM_ID_LEN: usize = 6;

/// Opaque room token chosen by the clients and passed in `join`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Short random token that is easy to read out to the other participant.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let token = (0..GENERATED_ROOM_ID_LEN)
            .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
            .collect::<String>();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty() && self.0.len() <= MAX_ROOM_ID_LEN
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
