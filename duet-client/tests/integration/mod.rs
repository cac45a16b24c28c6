
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Level;
use uuid::Uuid;

use duet_client::{CallSession, DuetClient, SessionEvent, SessionState};
use duet_core::{ConnectionId, SignalMessage};
use duet_server::{RelayConfig, RelayHandle, start_relay};

use crate::utils::{MockMedia, MockSignalSink};

pub const EVENT_TIMEOUT_MS: u64 = 3000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct TestSession {
    pub session: CallSession<MockMedia>,
    pub media: Arc<MockMedia>,
    pub sink: Arc<MockSignalSink>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// A session that already received its `welcome` as `local`.
pub async fn create_test_session(media: MockMedia, local: ConnectionId) -> TestSession {
    let media = Arc::new(media);
    let sink = Arc::new(MockSignalSink::new());
    let (tx, events) = mpsc::unbounded_channel();
    let session = CallSession::new(Arc::clone(&media), sink.clone(), tx);

    session
        .handle_signal(SignalMessage::Welcome {
            sender: local,
            ice_servers: vec![],
        })
        .await
        .expect("welcome");

    TestSession {
        session,
        media,
        sink,
        events,
    }
}

/// A real relay on an ephemeral loopback port, announcing no ICE servers.
pub async fn spawn_relay() -> RelayHandle {
    let config = RelayConfig {
        addr: ([127, 0, 0, 1], 0).into(),
        ice_servers: vec![],
        ..RelayConfig::default()
    };
    start_relay(config).await.expect("Failed to start relay")
}

/// A client on `relay` with mock media.
pub async fn connect(
    relay: &RelayHandle,
    name: &str,
) -> (DuetClient<MockMedia>, mpsc::UnboundedReceiver<SessionEvent>) {
    let (_media_tx, media_rx) = mpsc::unbounded_channel();
    DuetClient::connect(
        &relay.ws_url(),
        MockMedia::new(),
        media_rx,
        Some(name.to_owned()),
    )
    .await
    .expect("Failed to connect client")
}

pub fn conn(n: u128) -> ConnectionId {
    ConnectionId(Uuid::from_u128(n))
}

/// Wait until an event matching `pred` shows up, skipping the others.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    mut pred: F,
) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
    tokio::time::timeout(deadline, async {
        loop {
            match events.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("Timeout waiting for session event")
}

pub async fn wait_for_state(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    state: SessionState,
) {
    wait_for_event(events, |e| *e == SessionEvent::StateChanged(state)).await;
}

/// Drain what is already queued.
pub fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
