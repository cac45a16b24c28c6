use crate::media::{MediaBackend, MediaEvent, RemoteTrack, TransportConfig};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use duet_core::IceServerConfig;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const STREAM_ID: &str = "duet";

#[derive(Default)]
struct RtcState {
    ice_servers: Vec<IceServerConfig>,
    tracks: Vec<Arc<TrackLocalStaticSample>>,
    peer_connection: Option<Arc<RTCPeerConnection>>,
}

/// webrtc-rs backed media: Opus/VP8 sample tracks on a single peer connection.
///
/// Samples are written by the application through [`RtcMedia::local_tracks`]. The
/// peer's media is read from [`RtcMedia::remote_tracks`] once a
/// [`MediaEvent::RemoteTrack`] has been reported.
pub struct RtcMedia {
    config: TransportConfig,
    events: mpsc::UnboundedSender<MediaEvent>,
    state: Mutex<RtcState>,
    remote_tracks: Arc<Mutex<Vec<Arc<TrackRemote>>>>,
}

impl RtcMedia {
    pub fn new(config: TransportConfig) -> (Self, mpsc::UnboundedReceiver<MediaEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let state = RtcState {
            ice_servers: config.ice_servers.clone(),
            ..RtcState::default()
        };
        let media = Self {
            config,
            events,
            state: Mutex::new(state),
            remote_tracks: Arc::new(Mutex::new(Vec::new())),
        };
        (media, rx)
    }

    pub async fn local_tracks(&self) -> Vec<Arc<TrackLocalStaticSample>> {
        self.state.lock().await.tracks.clone()
    }

    pub async fn remote_tracks(&self) -> Vec<Arc<TrackRemote>> {
        self.remote_tracks.lock().await.clone()
    }

    async fn peer_connection(&self) -> Result<Arc<RTCPeerConnection>> {
        self.state
            .lock()
            .await
            .peer_connection
            .clone()
            .context("local media has not been acquired")
    }

    fn create_tracks(&self) -> Vec<Arc<TrackLocalStaticSample>> {
        let mut tracks = Vec::new();
        if self.config.audio {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    ..Default::default()
                },
                "audio".to_owned(),
                STREAM_ID.to_owned(),
            )));
        }
        if self.config.video {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    ..Default::default()
                },
                "video".to_owned(),
                STREAM_ID.to_owned(),
            )));
        }
        tracks
    }

    async fn build_peer_connection(
        &self,
        ice_servers: &[IceServerConfig],
        tracks: &[Arc<TrackLocalStaticSample>],
    ) -> Result<Arc<RTCPeerConnection>> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(self.config.loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = self.events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => MediaEvent::Connected,
                        RTCPeerConnectionState::Failed => MediaEvent::Failed,
                        RTCPeerConnectionState::Disconnected => MediaEvent::Disconnected,
                        _ => return,
                    };
                    let _ = tx.send(event);
                })
            },
        ));

        let ice_tx = self.events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&json_candidate) else {
                    return;
                };
                let _ = tx.send(MediaEvent::LocalCandidate(value));
            })
        }));

        let track_tx = self.events.clone();
        let remote_tracks = Arc::clone(&self.remote_tracks);
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let remote_tracks = Arc::clone(&remote_tracks);

            Box::pin(async move {
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind: track.kind().to_string(),
                    mime_type: track.codec().capability.mime_type,
                };
                info!("Remote {} track {} ({})", remote.kind, remote.id, remote.mime_type);
                remote_tracks.lock().await.push(track);
                let _ = tx.send(MediaEvent::RemoteTrack(remote));
            })
        }));

        for track in tracks {
            let sender = peer_connection
                .add_track(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;

            // RTCP has to be drained for the interceptors (NACK, reports) to work.
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while sender.read(&mut rtcp_buf).await.is_ok() {}
            });
        }

        debug!("Peer connection created with {} track(s)", tracks.len());
        Ok(peer_connection)
    }
}

#[async_trait]
impl MediaBackend for RtcMedia {
    async fn set_ice_servers(&self, servers: Vec<IceServerConfig>) {
        if servers.is_empty() {
            return;
        }
        self.state.lock().await.ice_servers = servers;
    }

    async fn acquire_local_media(&self) -> Result<()> {
        if !self.config.audio && !self.config.video {
            bail!("neither audio nor video was requested");
        }

        let mut state = self.state.lock().await;
        if state.tracks.is_empty() {
            state.tracks = self.create_tracks();
        }
        if state.peer_connection.is_none() {
            let pc = self
                .build_peer_connection(&state.ice_servers, &state.tracks)
                .await?;
            state.peer_connection = Some(pc);
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        let pc = self.peer_connection().await?;
        let offer = pc.create_offer(None).await?;
        pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: &str) -> Result<String> {
        let pc = self.peer_connection().await?;
        let desc = RTCSessionDescription::offer(sdp.to_owned())?;
        pc.set_remote_description(desc).await?;

        let answer = pc.create_answer(None).await?;
        pc.set_local_description(answer.clone()).await?;
        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: &str) -> Result<()> {
        let pc = self.peer_connection().await?;
        let desc = RTCSessionDescription::answer(sdp.to_owned())?;
        pc.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: Value) -> Result<()> {
        let pc = self.peer_connection().await?;
        let candidate: RTCIceCandidateInit =
            serde_json::from_value(candidate).context("Failed to parse ICE candidate JSON")?;
        pc.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.remote_tracks.lock().await.clear();
        let mut state = self.state.lock().await;
        if let Some(old) = state.peer_connection.take() {
            if let Err(e) = old.close().await {
                warn!("Failed to close abandoned peer connection: {}", e);
            }
        }
        if !state.tracks.is_empty() {
            let pc = self
                .build_peer_connection(&state.ice_servers, &state.tracks)
                .await?;
            state.peer_connection = Some(pc);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.remote_tracks.lock().await.clear();
        let mut state = self.state.lock().await;
        state.tracks.clear();
        if let Some(pc) = state.peer_connection.take() {
            pc.close().await?;
        }
        Ok(())
    }
}
