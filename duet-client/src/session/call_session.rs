use crate::error::ClientError;
use crate::media::{MediaBackend, MediaEvent};
use crate::session::{SessionEvent, SessionState, SignalSink};
use duet_core::{ConnectionId, SignalMessage, sdp_from_payload};
use serde_json::{Value, json};
use std::mem;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{debug, info, warn};

struct SessionCore {
    state: SessionState,
    /// Bumped whenever in-flight work must be abandoned.
    generation: u64,
    local_id: Option<ConnectionId>,
    remote: Option<ConnectionId>,
    /// SDP of a remote offer received before local media was ready.
    pending_offer: Option<String>,
    /// Our offer while in `offering`, kept for a peer that joins late.
    local_offer: Option<Value>,
    pending_candidates: Vec<Value>,
    remote_description_set: bool,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionCore {
    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        info!("Call session {} -> {}", self.state, next);
        self.state = next;
        self.emit(SessionEvent::StateChanged(next));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Move to `closed` and invalidate everything in flight.
    fn close(&mut self) {
        self.generation += 1;
        self.remote_description_set = false;
        self.local_offer = None;
        self.pending_candidates.clear();
        self.set_state(SessionState::Closed);
    }

    fn forget_remote(&mut self) {
        self.remote = None;
        self.pending_offer = None;
        self.pending_candidates.clear();
        self.remote_description_set = false;
    }
}

/// One call, driven by relay messages, media events and the user.
///
/// Every method is safe to call concurrently with the others.
pub struct CallSession<M: MediaBackend> {
    inner: Arc<Mutex<SessionCore>>,
    media: Arc<M>,
    signal: Arc<dyn SignalSink>,
}

impl<M: MediaBackend> Clone for CallSession<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            media: Arc::clone(&self.media),
            signal: Arc::clone(&self.signal),
        }
    }
}

impl<M: MediaBackend> CallSession<M> {
    pub fn new(
        media: Arc<M>,
        signal: Arc<dyn SignalSink>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionCore {
                state: SessionState::Idle,
                generation: 0,
                local_id: None,
                remote: None,
                pending_offer: None,
                local_offer: None,
                pending_candidates: Vec::new(),
                remote_description_set: false,
                events,
            })),
            media,
            signal,
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn local_id(&self) -> Option<ConnectionId> {
        self.inner.lock().await.local_id
    }

    pub async fn remote(&self) -> Option<ConnectionId> {
        self.inner.lock().await.remote
    }

    pub fn media(&self) -> &Arc<M> {
        &self.media
    }

    /// Acquire local media, then offer or answer depending on whether a remote
    /// offer is already waiting.
    pub async fn start_call(&self) -> Result<(), ClientError> {
        let generation = {
            let mut core = self.inner.lock().await;
            if !core.state.can_start_call() {
                return Err(ClientError::InvalidState {
                    action: "start a call",
                    state: core.state,
                });
            }
            if core.state == SessionState::Closed {
                core.remote_description_set = false;
                core.set_state(SessionState::Idle);
            }
            core.set_state(SessionState::AwaitingMedia);
            core.generation
        };

        let acquired = self.media.acquire_local_media().await;

        let mut core = self.inner.lock().await;
        if core.generation != generation {
            return self.discard_stale(core).await;
        }
        if let Err(e) = acquired {
            warn!("Local media unavailable: {:#}", e);
            core.set_state(SessionState::Idle);
            let err = ClientError::MediaUnavailable(e.to_string());
            core.emit(SessionEvent::Error(err.clone()));
            return Err(err);
        }

        match core.pending_offer.take() {
            Some(offer_sdp) => {
                core.set_state(SessionState::Answering);
                drop(core);
                self.answer(generation, offer_sdp).await
            }
            None => {
                core.set_state(SessionState::Offering);
                drop(core);
                self.offer(generation).await
            }
        }
    }

    /// Apply one message received from the relay.
    pub async fn handle_signal(&self, msg: SignalMessage) -> Result<(), ClientError> {
        match msg {
            SignalMessage::Welcome {
                sender,
                ice_servers,
            } => {
                self.inner.lock().await.local_id = Some(sender);
                self.media.set_ice_servers(ice_servers).await;
                Ok(())
            }
            SignalMessage::Offer { payload, sender } => self.on_offer(payload, sender).await,
            SignalMessage::Answer { payload, sender } => self.on_answer(payload, sender).await,
            SignalMessage::Candidate { payload, .. } => {
                self.on_remote_candidate(payload).await;
                Ok(())
            }
            SignalMessage::Joined { peers, .. } => {
                let Some(peer) = peers.first() else {
                    return Ok(());
                };
                let mut core = self.inner.lock().await;
                core.remote = Some(peer.id);
                self.repeat_offer(core).await
            }
            SignalMessage::PeerJoined { sender, .. } => {
                let mut core = self.inner.lock().await;
                core.remote = Some(sender);
                self.repeat_offer(core).await
            }
            SignalMessage::PeerLeft { sender } => {
                self.on_peer_left(sender).await;
                Ok(())
            }
            SignalMessage::Error { code, message } => {
                warn!("Relay reported {}: {}", code, message);
                let err = ClientError::Rejected { code, message };
                self.inner
                    .lock()
                    .await
                    .emit(SessionEvent::Error(err.clone()));
                Err(err)
            }
            other => {
                debug!("Call session ignores {}", other.kind());
                Ok(())
            }
        }
    }

    pub async fn handle_media_event(&self, event: MediaEvent) -> Result<(), ClientError> {
        match event {
            MediaEvent::LocalCandidate(candidate) => {
                let core = self.inner.lock().await;
                if !core.state.is_negotiating() {
                    debug!("Dropping local candidate while {}", core.state);
                    return Ok(());
                }
                self.send(SignalMessage::Candidate {
                    payload: candidate,
                    sender: None,
                })
                .await
            }
            MediaEvent::Connected => {
                info!("Media link established");
                Ok(())
            }
            MediaEvent::Failed => {
                let generation = {
                    let core = self.inner.lock().await;
                    if core.state == SessionState::Closed {
                        return Ok(());
                    }
                    core.generation
                };
                self.fail(generation, "peer link failed".to_owned()).await
            }
            MediaEvent::Disconnected => {
                let mut core = self.inner.lock().await;
                if core.state == SessionState::Closed {
                    return Ok(());
                }
                warn!("Media link lost");
                core.close();
                drop(core);
                self.release_media().await;
                Ok(())
            }
            MediaEvent::RemoteTrack(track) => {
                info!("Receiving remote {} track {}", track.kind, track.id);
                self.inner
                    .lock()
                    .await
                    .emit(SessionEvent::RemoteTrack(track));
                Ok(())
            }
        }
    }

    /// Tell the relay we are leaving and close the call.
    pub async fn leave(&self) -> Result<(), ClientError> {
        let mut core = self.inner.lock().await;
        if let Err(e) = self.send(SignalMessage::Leave).await {
            warn!("Could not send leave: {}", e);
        }
        core.forget_remote();
        core.close();
        drop(core);

        self.release_media().await;
        Ok(())
    }

    /// The relay connection is gone for good.
    pub async fn transport_dropped(&self) {
        let mut core = self.inner.lock().await;
        let was_open = core.state != SessionState::Closed;
        core.forget_remote();
        core.close();
        core.emit(SessionEvent::Error(ClientError::TransportDropped));
        drop(core);

        if was_open {
            self.release_media().await;
        }
    }

    async fn offer(&self, generation: u64) -> Result<(), ClientError> {
        let sdp = match self.media.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => return self.fail(generation, format!("create offer: {e:#}")).await,
        };

        let mut core = self.inner.lock().await;
        if core.generation != generation {
            return self.discard_stale(core).await;
        }
        info!("Sending offer");
        let payload = json!({ "type": "offer", "sdp": sdp });
        core.local_offer = Some(payload.clone());
        if let Err(e) = self
            .send(SignalMessage::Offer {
                payload,
                sender: None,
            })
            .await
        {
            return self.abort(core, e).await;
        }
        Ok(())
    }

    async fn answer(&self, generation: u64, offer_sdp: String) -> Result<(), ClientError> {
        let sdp = match self.media.accept_offer(&offer_sdp).await {
            Ok(sdp) => sdp,
            Err(e) => return self.fail(generation, format!("accept offer: {e:#}")).await,
        };

        let mut core = self.inner.lock().await;
        if core.generation != generation {
            return self.discard_stale(core).await;
        }
        info!("Sending answer");
        if let Err(e) = self
            .send(SignalMessage::Answer {
                payload: json!({ "type": "answer", "sdp": sdp }),
                sender: None,
            })
            .await
        {
            return self.abort(core, e).await;
        }
        core.set_state(SessionState::Connected);
        drop(core);

        self.flush_candidates(generation).await;
        Ok(())
    }

    async fn on_offer(
        &self,
        payload: Value,
        sender: Option<ConnectionId>,
    ) -> Result<(), ClientError> {
        let mut core = self.inner.lock().await;
        if matches!(
            core.state,
            SessionState::Answering | SessionState::Connected
        ) {
            warn!("Ignoring offer while {}: renegotiation is not supported", core.state);
            return Ok(());
        }

        let generation = core.generation;
        let Some(sdp) = sdp_from_payload(&payload).map(str::to_owned) else {
            drop(core);
            return self.fail(generation, "malformed offer".to_owned()).await;
        };
        if sender.is_some() {
            core.remote = sender;
        }

        match core.state {
            SessionState::Idle | SessionState::AwaitingMedia | SessionState::Closed => {
                info!("Holding remote offer until local media is ready");
                core.pending_offer = Some(sdp);
                core.emit(SessionEvent::IncomingOffer { from: sender });
                Ok(())
            }
            SessionState::Offering => {
                let (Some(local), Some(remote)) = (core.local_id, sender) else {
                    drop(core);
                    return self.fail(generation, "offer collision".to_owned()).await;
                };
                if local > remote {
                    warn!("Offer collision with {}: keeping our own offer", remote);
                    return self.repeat_offer(core).await;
                }

                warn!("Offer collision with {}: answering theirs", remote);
                core.generation += 1;
                let generation = core.generation;
                core.remote_description_set = false;
                core.local_offer = None;
                core.set_state(SessionState::Answering);
                drop(core);

                if let Err(e) = self.media.reset().await {
                    return self.fail(generation, format!("reset: {e:#}")).await;
                }
                self.answer(generation, sdp).await
            }
            SessionState::Answering | SessionState::Connected => Ok(()),
        }
    }

    async fn on_answer(
        &self,
        payload: Value,
        sender: Option<ConnectionId>,
    ) -> Result<(), ClientError> {
        let generation = {
            let core = self.inner.lock().await;
            if core.state != SessionState::Offering {
                warn!("Ignoring answer while {}", core.state);
                return Ok(());
            }
            core.generation
        };
        let Some(sdp) = sdp_from_payload(&payload) else {
            return self.fail(generation, "malformed answer".to_owned()).await;
        };

        if let Err(e) = self.media.apply_answer(sdp).await {
            return self.fail(generation, format!("apply answer: {e:#}")).await;
        }

        let mut core = self.inner.lock().await;
        if core.generation != generation {
            return self.discard_stale(core).await;
        }
        if sender.is_some() {
            core.remote = sender;
        }
        core.set_state(SessionState::Connected);
        drop(core);

        self.flush_candidates(generation).await;
        Ok(())
    }

    async fn on_remote_candidate(&self, candidate: Value) {
        {
            let mut core = self.inner.lock().await;
            if !core.remote_description_set {
                debug!("Queueing remote candidate");
                core.pending_candidates.push(candidate);
                return;
            }
        }

        if let Err(e) = self.media.add_remote_candidate(candidate).await {
            warn!("Failed to apply remote candidate: {:#}", e);
        }
    }

    async fn on_peer_left(&self, peer: ConnectionId) {
        let mut core = self.inner.lock().await;
        info!("Peer {} left", peer);

        match core.state {
            SessionState::Idle => core.forget_remote(),
            SessionState::Closed => {}
            _ => {
                core.forget_remote();
                core.close();
                drop(core);
                self.release_media().await;
            }
        }
    }

    /// Apply queued remote candidates in arrival order, then let new ones through.
    async fn flush_candidates(&self, generation: u64) {
        loop {
            let queued = {
                let mut core = self.inner.lock().await;
                if core.generation != generation {
                    return;
                }
                if core.pending_candidates.is_empty() {
                    core.remote_description_set = true;
                    return;
                }
                mem::take(&mut core.pending_candidates)
            };

            debug!("Applying {} queued candidate(s)", queued.len());
            for candidate in queued {
                if let Err(e) = self.media.add_remote_candidate(candidate).await {
                    warn!("Failed to apply remote candidate: {:#}", e);
                }
            }
        }
    }

    /// Negotiation is unrecoverable: close and report.
    async fn fail(&self, generation: u64, reason: String) -> Result<(), ClientError> {
        let mut core = self.inner.lock().await;
        if core.generation != generation {
            return self.discard_stale(core).await;
        }

        warn!("Negotiation failed: {}", reason);
        let err = ClientError::NegotiationFailed(reason);
        core.close();
        core.emit(SessionEvent::Error(err.clone()));
        drop(core);

        self.release_media().await;
        Err(err)
    }

    /// Send our offer again. It may have gone out while we were alone in the room,
    /// or the peer may have dropped it in favour of its own.
    async fn repeat_offer(&self, core: MutexGuard<'_, SessionCore>) -> Result<(), ClientError> {
        if core.state != SessionState::Offering {
            return Ok(());
        }
        let Some(payload) = core.local_offer.clone() else {
            return Ok(());
        };

        info!("Repeating offer");
        if let Err(e) = self
            .send(SignalMessage::Offer {
                payload,
                sender: None,
            })
            .await
        {
            return self.abort(core, e).await;
        }
        Ok(())
    }

    /// A negotiation message could not be sent: the attempt is over.
    async fn abort(
        &self,
        mut core: MutexGuard<'_, SessionCore>,
        err: ClientError,
    ) -> Result<(), ClientError> {
        warn!("Call attempt aborted: {}", err);
        core.close();
        core.emit(SessionEvent::Error(err.clone()));
        drop(core);

        self.release_media().await;
        Err(err)
    }

    /// A step finished after the session moved on. Nothing is sent; media
    /// acquired on behalf of a closed session is released.
    async fn discard_stale(&self, core: MutexGuard<'_, SessionCore>) -> Result<(), ClientError> {
        let closed = core.state == SessionState::Closed;
        drop(core);

        debug!("Discarding result of an abandoned step");
        if closed {
            self.release_media().await;
        }
        Ok(())
    }

    async fn release_media(&self) {
        if let Err(e) = self.media.close().await {
            warn!("Failed to release media: {:#}", e);
        }
    }

    async fn send(&self, msg: SignalMessage) -> Result<(), ClientError> {
        debug!("-> {}", msg.kind());
        self.signal.send_signal(msg).await
    }
}
