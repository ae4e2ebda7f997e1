use crate::link::{LinkBuilder, LinkError, LinkEvent, LinkState, PeerLink, RemoteTrackInfo};
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{HintPayload, MediaKind, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub ice_servers: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

/// Builds `WebRtcLink`s sharing one set of local capture tracks.
pub struct WebRtcLinkBuilder {
    config: LinkConfig,
    audio_track: Option<Arc<TrackLocalStaticSample>>,
    video_track: Option<Arc<TrackLocalStaticSample>>,
}

impl WebRtcLinkBuilder {
    pub fn new(
        config: LinkConfig,
        audio_track: Option<Arc<TrackLocalStaticSample>>,
        video_track: Option<Arc<TrackLocalStaticSample>>,
    ) -> Self {
        Self {
            config,
            audio_track,
            video_track,
        }
    }
}

#[async_trait]
impl LinkBuilder for WebRtcLinkBuilder {
    async fn build(
        &self,
        peer: ParticipantId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Arc<dyn PeerLink>> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.config.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = events.clone();
        let state_peer = peer.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let peer = state_peer.clone();

            Box::pin(async move {
                info!(%peer, state = ?s, "peer connection state changed");
                let mapped = match s {
                    RTCPeerConnectionState::New | RTCPeerConnectionState::Connecting => {
                        LinkState::Connecting
                    }
                    RTCPeerConnectionState::Connected => LinkState::Connected,
                    RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
                    RTCPeerConnectionState::Failed => LinkState::Failed,
                    RTCPeerConnectionState::Closed => LinkState::Closed,
                    RTCPeerConnectionState::Unspecified => return,
                };
                let _ = tx.send(LinkEvent::StateChanged(peer, mapped)).await;
            })
        }));

        // Trickle ICE: relay locally gathered candidates through the engine.
        let hint_tx = events.clone();
        let hint_peer = peer.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = hint_tx.clone();
            let peer = hint_peer.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let hint = HintPayload {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(LinkEvent::LocalHint(peer, hint)).await;
            })
        }));

        let track_tx = events.clone();
        let track_peer = peer.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let peer = track_peer.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => MediaKind::Audio,
                    RTPCodecType::Video => MediaKind::Video,
                    RTPCodecType::Unspecified => return,
                };
                debug!(%peer, ?kind, "remote track arrived");
                let info = RemoteTrackInfo {
                    kind,
                    track_id: track.id(),
                };
                let _ = tx.send(LinkEvent::RemoteTrack(peer, info)).await;
            })
        }));

        if let Some(audio) = &self.audio_track {
            pc.add_track(Arc::clone(audio) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
        }

        let mut video_sender = None;
        if let Some(video) = &self.video_track {
            let sender = pc
                .add_track(Arc::clone(video) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
            video_sender = Some(sender);
        }

        Ok(Arc::new(WebRtcLink {
            peer,
            pc,
            video_sender,
            video_track: self.video_track.clone(),
        }))
    }
}

/// `PeerLink` over a webrtc-rs `RTCPeerConnection`.
pub struct WebRtcLink {
    peer: ParticipantId,
    pc: Arc<RTCPeerConnection>,
    video_sender: Option<Arc<RTCRtpSender>>,
    video_track: Option<Arc<TrackLocalStaticSample>>,
}

#[async_trait]
impl PeerLink for WebRtcLink {
    async fn create_offer(&self) -> Result<String, LinkError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| LinkError::Description(e.to_string()))?;
        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(|e| LinkError::Description(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, LinkError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| LinkError::Description(e.to_string()))?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(|e| LinkError::Description(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_remote_offer(&self, sdp: String) -> Result<(), LinkError> {
        let desc =
            RTCSessionDescription::offer(sdp).map_err(|e| LinkError::Description(e.to_string()))?;
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| LinkError::Description(e.to_string()))
    }

    async fn set_remote_answer(&self, sdp: String) -> Result<(), LinkError> {
        let desc = RTCSessionDescription::answer(sdp)
            .map_err(|e| LinkError::Description(e.to_string()))?;
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| LinkError::Description(e.to_string()))
    }

    async fn apply_hint(&self, hint: HintPayload) -> Result<(), LinkError> {
        let init = RTCIceCandidateInit {
            candidate: hint.candidate,
            sdp_mid: hint.sdp_mid,
            sdp_mline_index: hint.sdp_m_line_index,
            ..Default::default()
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| LinkError::Hint(e.to_string()))
    }

    async fn set_outbound_video(&self, enabled: bool) -> Result<(), LinkError> {
        let Some(sender) = &self.video_sender else {
            // Not sending video at all; nothing to mute.
            return Ok(());
        };
        let replacement = if enabled {
            self.video_track
                .clone()
                .map(|t| t as Arc<dyn TrackLocal + Send + Sync>)
        } else {
            None
        };
        sender
            .replace_track(replacement)
            .await
            .map_err(|e| LinkError::Description(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            warn!(peer = %self.peer, error = %e, "error closing peer connection");
        }
    }
}
