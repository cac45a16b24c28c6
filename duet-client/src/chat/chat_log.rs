use chrono::{DateTime, Local, Utc};
use duet_core::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAuthor {
    Me(String),
    Peer {
        id: Option<ConnectionId>,
        name: String,
    },
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub author: ChatAuthor,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ChatEntry {
    /// `author [HH:MM:SS]: text`, or the bare text for system entries.
    pub fn render(&self) -> String {
        let author = match &self.author {
            ChatAuthor::Me(name) => name,
            ChatAuthor::Peer { name, .. } => name,
            ChatAuthor::System => return self.text.clone(),
        };
        format!("{} [{}]: {}", author, clock_time(self.timestamp), self.text)
    }
}

/// In-memory history of one client session.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_own(&mut self, name: &str, text: &str, timestamp: u64) -> ChatEntry {
        self.push(ChatEntry {
            author: ChatAuthor::Me(name.to_owned()),
            text: text.to_owned(),
            timestamp,
        })
    }

    pub fn push_remote(
        &mut self,
        id: Option<ConnectionId>,
        name: &str,
        text: &str,
        timestamp: u64,
    ) -> ChatEntry {
        self.push(ChatEntry {
            author: ChatAuthor::Peer {
                id,
                name: name.to_owned(),
            },
            text: text.to_owned(),
            timestamp,
        })
    }

    pub fn peer_joined(&mut self, name: &str) -> ChatEntry {
        self.push_system(format!("{name} has joined the chat"))
    }

    pub fn peer_left(&mut self, name: &str) -> ChatEntry {
        self.push_system(format!("{name} has left the chat"))
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    fn push_system(&mut self, text: String) -> ChatEntry {
        self.push(ChatEntry {
            author: ChatAuthor::System,
            text,
            timestamp: now_millis(),
        })
    }

    fn push(&mut self, entry: ChatEntry) -> ChatEntry {
        self.entries.push(entry.clone());
        entry
    }
}

pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Local time of day, `HH:MM:SS`.
fn clock_time(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_owned())
}
