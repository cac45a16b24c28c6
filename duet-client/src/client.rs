use crate::chat::{ChatEntry, ChatLog, generate_display_name, now_millis};
use crate::error::ClientError;
use crate::media::{MediaBackend, MediaEvent};
use crate::session::{CallSession, SessionEvent, SessionState};
use crate::transport::{RelayConnection, RelaySender};
use duet_core::{ConnectionId, PeerInfo, RoomId, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const WELCOME_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Presence {
    room: Option<RoomId>,
    peers: Vec<PeerInfo>,
    chat: ChatLog,
}

impl Presence {
    fn peer_name(&self, id: &ConnectionId) -> String {
        self.peers
            .iter()
            .find(|p| &p.id == id)
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// A participant: relay connection, call session, room presence and chat.
pub struct DuetClient<M: MediaBackend> {
    local_id: ConnectionId,
    display_name: String,
    session: CallSession<M>,
    sender: RelaySender,
    presence: Arc<Mutex<Presence>>,
    pump: JoinHandle<()>,
}

impl<M: MediaBackend> DuetClient<M> {
    /// Connect to the relay at `url` and wait for its `welcome`.
    ///
    /// `media_events` is the event channel of `media`. A random display name is used
    /// when `name` is `None`.
    pub async fn connect(
        url: &str,
        media: M,
        media_events: mpsc::UnboundedReceiver<MediaEvent>,
        name: Option<String>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), ClientError> {
        let (sender, mut inbound) = RelayConnection::connect(url).await?;
        let (events, events_rx) = mpsc::unbounded_channel();
        let session = CallSession::new(Arc::new(media), Arc::new(sender.clone()), events.clone());

        let welcome = tokio::time::timeout(WELCOME_TIMEOUT, inbound.recv())
            .await
            .map_err(|_| ClientError::RelayUnreachable("no welcome from relay".to_owned()))?;
        let Some(welcome) = welcome else {
            return Err(ClientError::TransportDropped);
        };
        let local_id = match &welcome {
            SignalMessage::Welcome { sender, .. } => *sender,
            other => {
                return Err(ClientError::RelayUnreachable(format!(
                    "expected welcome, got {}",
                    other.kind()
                )));
            }
        };
        session.handle_signal(welcome).await?;

        let display_name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(generate_display_name);
        info!("Connected as {} ({})", display_name, local_id);

        let presence = Arc::new(Mutex::new(Presence::default()));
        let pump = tokio::spawn(pump(
            session.clone(),
            Arc::clone(&presence),
            events,
            inbound,
            media_events,
        ));

        let client = Self {
            local_id,
            display_name,
            session,
            sender,
            presence,
            pump,
        };
        Ok((client, events_rx))
    }

    pub async fn join(&self, room_id: impl Into<RoomId>) -> Result<(), ClientError> {
        let room_id = room_id.into();
        info!("Joining room {}", room_id);
        self.sender.send(&SignalMessage::Join {
            room_id,
            name: Some(self.display_name.clone()),
        })
    }

    /// Join a freshly generated room; returns its id for sharing with the peer.
    pub async fn create_room(&self) -> Result<RoomId, ClientError> {
        let room_id = RoomId::generate();
        self.join(room_id.clone()).await?;
        Ok(room_id)
    }

    pub async fn start_call(&self) -> Result<(), ClientError> {
        self.session.start_call().await
    }

    /// Send a chat line to the room. Blank text, or text sent while not in a room,
    /// is ignored.
    pub async fn send_chat(&self, text: &str) -> Result<Option<ChatEntry>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mut presence = self.presence.lock().await;
        if presence.room.is_none() {
            debug!("Not in a room, chat line dropped");
            return Ok(None);
        }

        let timestamp = now_millis();
        self.sender.send(&SignalMessage::Chat {
            payload: text.to_owned(),
            sender: None,
            timestamp,
        })?;
        Ok(Some(presence.chat.push_own(&self.display_name, text, timestamp)))
    }

    pub async fn leave(&self) -> Result<(), ClientError> {
        self.session.leave().await?;
        let mut presence = self.presence.lock().await;
        presence.room = None;
        presence.peers.clear();
        Ok(())
    }

    pub async fn state(&self) -> SessionState {
        self.session.state().await
    }

    /// Everyone in the room, this client included.
    pub async fn participants(&self) -> usize {
        1 + self.presence.lock().await.peers.len()
    }

    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.presence.lock().await.peers.clone()
    }

    pub async fn room(&self) -> Option<RoomId> {
        self.presence.lock().await.room.clone()
    }

    pub async fn chat_history(&self) -> Vec<ChatEntry> {
        self.presence.lock().await.chat.entries().to_vec()
    }

    pub fn local_id(&self) -> ConnectionId {
        self.local_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn session(&self) -> &CallSession<M> {
        &self.session
    }
}

impl<M: MediaBackend> Drop for DuetClient<M> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Feed relay messages and media events into the session; keep presence and chat.
async fn pump<M: MediaBackend>(
    session: CallSession<M>,
    presence: Arc<Mutex<Presence>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut inbound: mpsc::UnboundedReceiver<SignalMessage>,
    mut media_events: mpsc::UnboundedReceiver<MediaEvent>,
) {
    let mut media_open = true;

    loop {
        tokio::select! {
            msg = inbound.recv() => {
                let Some(msg) = msg else {
                    warn!("Relay connection dropped");
                    session.transport_dropped().await;
                    break;
                };
                on_relay_message(&session, &presence, &events, msg).await;
            }

            event = media_events.recv(), if media_open => {
                match event {
                    Some(event) => {
                        if let Err(e) = session.handle_media_event(event).await {
                            debug!("Media event handling failed: {}", e);
                        }
                    }
                    None => media_open = false,
                }
            }
        }
    }
}

async fn on_relay_message<M: MediaBackend>(
    session: &CallSession<M>,
    presence: &Mutex<Presence>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    msg: SignalMessage,
) {
    match &msg {
        SignalMessage::Joined { room_id, peers } => {
            let mut presence = presence.lock().await;
            presence.room = Some(room_id.clone());
            presence.peers = peers.clone();
            info!("Joined room {} with {} peer(s)", room_id, peers.len());
            let _ = events.send(SessionEvent::Joined {
                room_id: room_id.clone(),
                peers: peers.clone(),
            });
        }
        SignalMessage::PeerJoined { sender, name } => {
            let peer = PeerInfo {
                id: *sender,
                name: name.clone(),
            };
            let mut presence = presence.lock().await;
            presence.peers.retain(|p| p.id != *sender);
            presence.peers.push(peer.clone());
            let label = presence.peer_name(sender);
            let entry = presence.chat.peer_joined(&label);
            let _ = events.send(SessionEvent::PeerJoined(peer));
            let _ = events.send(SessionEvent::Chat(entry));
        }
        SignalMessage::PeerLeft { sender } => {
            let mut presence = presence.lock().await;
            let label = presence.peer_name(sender);
            presence.peers.retain(|p| p.id != *sender);
            let entry = presence.chat.peer_left(&label);
            let _ = events.send(SessionEvent::PeerLeft(*sender));
            let _ = events.send(SessionEvent::Chat(entry));
        }
        SignalMessage::Chat {
            payload,
            sender,
            timestamp,
        } => {
            let mut presence = presence.lock().await;
            let name = match sender {
                Some(id) => presence.peer_name(id),
                None => "unknown".to_owned(),
            };
            let entry = presence
                .chat
                .push_remote(*sender, &name, payload, *timestamp);
            let _ = events.send(SessionEvent::Chat(entry));
            return;
        }
        _ => {}
    }

    if let Err(e) = session.handle_signal(msg).await {
        debug!("Relay message handling failed: {}", e);
    }
}
