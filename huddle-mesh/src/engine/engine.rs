use crate::engine::EngineCommand;
use crate::error::SessionError;
use crate::link::{LinkBuilder, LinkEvent, LinkState, PeerLinkFactory};
use crate::media::LocalMediaSource;
use crate::session::{NegotiationState, SessionRegistry, answers_glare};
use crate::signaling::SignalingOutput;
use crate::view::{PeerView, RoomView};
use dashmap::DashMap;
use huddle_core::{HintPayload, MediaKind, MediaState, Participant, ParticipantId, SignalMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct MeshConfig {
    pub room: String,
    pub display_name: String,
}

/// Channel ends and the shared view, handed to the embedding layer when the
/// engine is constructed.
pub struct EngineHandles {
    pub signal_tx: mpsc::Sender<SignalMessage>,
    pub command_tx: mpsc::Sender<EngineCommand>,
    pub view: RoomView,
}

/// Connection-lifecycle engine for one room.
///
/// One task owns the engine and runs [`MeshEngine::run`]; every signaling
/// message, link callback, and user intent is funneled through that loop,
/// so session state never sees concurrent mutation and per-peer arrival
/// order is preserved.
pub struct MeshEngine {
    config: MeshConfig,
    local: Option<Participant>,
    local_media: MediaState,
    registry: SessionRegistry,
    factory: PeerLinkFactory,
    signaling: Arc<dyn SignalingOutput>,
    media_source: Arc<dyn LocalMediaSource>,
    view: RoomView,
    signal_rx: mpsc::Receiver<SignalMessage>,
    command_rx: mpsc::Receiver<EngineCommand>,
    link_rx: mpsc::Receiver<LinkEvent>,
}

impl MeshEngine {
    pub fn new(
        config: MeshConfig,
        builder: Arc<dyn LinkBuilder>,
        signaling: Arc<dyn SignalingOutput>,
        media_source: Arc<dyn LocalMediaSource>,
    ) -> (Self, EngineHandles) {
        let (signal_tx, signal_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (link_tx, link_rx) = mpsc::channel(256);

        let view: RoomView = Arc::new(DashMap::new());
        let engine = Self {
            config,
            local: None,
            local_media: MediaState::default(),
            registry: SessionRegistry::new(),
            factory: PeerLinkFactory::new(builder, link_tx),
            signaling,
            media_source,
            view: view.clone(),
            signal_rx,
            command_rx,
            link_rx,
        };

        let handles = EngineHandles {
            signal_tx,
            command_tx,
            view,
        };
        (engine, handles)
    }

    pub fn view(&self) -> RoomView {
        self.view.clone()
    }

    pub fn local_media(&self) -> MediaState {
        self.local_media
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn factory(&self) -> &PeerLinkFactory {
        &self.factory
    }

    /// Drive the engine until the room is left or every input closes.
    /// Teardown of all sessions runs on every exit path.
    pub async fn run(mut self) {
        info!(room = %self.config.room, "mesh engine started");

        self.signaling
            .send(SignalMessage::Join {
                room: self.config.room.clone(),
                display_name: self.config.display_name.clone(),
            })
            .await;

        loop {
            tokio::select! {
                msg = self.signal_rx.recv() => {
                    match msg {
                        Some(m) => self.handle_signal(m).await,
                        None => {
                            info!("signal channel closed, shutting down");
                            break;
                        }
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::Leave) => {
                            info!("leave requested");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("command channel closed, shutting down");
                            break;
                        }
                    }
                }

                evt = self.link_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_link_event(e).await,
                        None => {
                            warn!("link event channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
        info!("mesh engine finished");
    }

    pub async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Welcome { participant } => self.handle_welcome(participant),
            SignalMessage::RoomSnapshot { participants } => self.reconcile(participants).await,
            SignalMessage::Offer { peer, sdp } => self.handle_offer(peer, sdp).await,
            SignalMessage::Answer { peer, sdp } => self.handle_answer(peer, sdp).await,
            SignalMessage::Hint { peer, payload } => self.handle_hint(peer, payload).await,
            SignalMessage::ParticipantLeft { peer } => {
                if self.registry.contains(&peer) {
                    self.teardown(&peer, "participant left").await;
                } else {
                    debug!(%peer, "leave notice for unknown participant, ignoring");
                }
            }
            SignalMessage::MediaState { peer, audio, video } => {
                self.handle_remote_media_state(peer, audio, video);
            }
            SignalMessage::MediaStateRequest { peer } => {
                self.announce_media_state(peer).await;
            }
            SignalMessage::VideoMuteRequest { peer, mute } => {
                self.handle_video_mute_request(peer, mute).await;
            }
            SignalMessage::VideoMuteResponse { peer, mute } => {
                self.handle_video_mute_response(peer, mute);
            }
            SignalMessage::Join { .. } => {
                debug!("join message echoed back, ignoring");
            }
        }
    }

    pub async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::ToggleMedia { kind } => {
                let enabled = !self.local_media.get(kind);
                if let Err(e) = self.set_local_media(kind, enabled).await {
                    warn!(error = %e, "cannot toggle local media");
                }
            }
            EngineCommand::SetMedia { kind, enabled } => {
                if let Err(e) = self.set_local_media(kind, enabled).await {
                    warn!(error = %e, "cannot set local media");
                }
            }
            EngineCommand::RequestVideoMute { peer, mute } => {
                self.request_video_mute(peer, mute).await;
            }
            // The run loop intercepts Leave before dispatching here.
            EngineCommand::Leave => {}
        }
    }

    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::LocalHint(peer, payload) => {
                if self.registry.contains(&peer) {
                    self.signaling
                        .send(SignalMessage::Hint { peer, payload })
                        .await;
                } else {
                    debug!(%peer, "local hint for closed session, discarding");
                }
            }
            LinkEvent::RemoteTrack(peer, track) => {
                if let Some(mut entry) = self.view.get_mut(&peer) {
                    info!(%peer, kind = ?track.kind, "remote track attached");
                    entry.tracks.push(track);
                } else {
                    debug!(%peer, "remote track for closed session, discarding");
                }
            }
            LinkEvent::StateChanged(peer, state) => {
                debug!(%peer, ?state, "link state changed");
                if matches!(
                    state,
                    LinkState::Failed | LinkState::Disconnected | LinkState::Closed
                ) && self.registry.contains(&peer)
                {
                    self.teardown(&peer, "link lost").await;
                }
            }
        }
    }

    fn handle_welcome(&mut self, participant: Participant) {
        info!(id = %participant.id, "welcomed into the room");

        if !self.media_source.is_available() {
            // Receive-only: links still get remote media, we just send none.
            error!("local media source unavailable, continuing receive-only");
            self.local_media = MediaState {
                audio: false,
                video: false,
            };
        }

        let color = self.registry.color_for(&participant.id);
        self.view.insert(
            participant.id.clone(),
            PeerView {
                participant: participant.clone(),
                color,
                media: self.local_media,
                negotiation: NegotiationState::Stable,
                remote_mute_requested: false,
                local_mute_requested: false,
                tracks: Vec::new(),
            },
        );
        self.local = Some(participant);
    }

    /// Bring the registry in line with an authoritative membership list:
    /// unknown ids get a session and an offer, vanished ids get torn down,
    /// and only freshly created sessions trigger media-state exchange.
    /// Feeding the same snapshot twice is a no-op the second time.
    pub async fn reconcile(&mut self, participants: Vec<Participant>) {
        let Some(local) = self.local.clone() else {
            warn!("room snapshot before welcome, dropping");
            return;
        };

        let present: HashSet<ParticipantId> =
            participants.iter().map(|p| p.id.clone()).collect();

        let mut created = Vec::new();
        for p in &participants {
            if p.id == local.id {
                continue;
            }
            if self.registry.contains(&p.id) {
                // Session may predate the snapshot (inbound offer); adopt
                // the authoritative display name.
                let mut renamed = false;
                if let Some(session) = self.registry.get_mut(&p.id) {
                    if session.participant.display_name != p.display_name {
                        session.participant.display_name = p.display_name.clone();
                        renamed = true;
                    }
                }
                if renamed {
                    self.sync_view(&p.id);
                }
                continue;
            }

            info!(peer = %p.id, "new participant, initiating negotiation");
            self.registry.create(p.clone());
            self.sync_view(&p.id);
            self.initiate_offer(&p.id).await;
            created.push(p.id.clone());
        }

        for id in self.registry.ids() {
            if !present.contains(&id) {
                self.teardown(&id, "absent from room snapshot").await;
            }
        }

        for id in &created {
            // Negotiation may already have failed and removed the session.
            if !self.registry.contains(id) {
                continue;
            }
            self.signaling
                .send(SignalMessage::MediaStateRequest { peer: id.clone() })
                .await;
            self.signaling
                .send(SignalMessage::MediaState {
                    peer: id.clone(),
                    audio: self.local_media.audio,
                    video: self.local_media.video,
                })
                .await;
        }
    }

    async fn initiate_offer(&mut self, peer: &ParticipantId) {
        let link = match self.factory.acquire(peer).await {
            Ok(link) => link,
            Err(e) => {
                self.fail_negotiation(peer, &format!("link construction: {e:#}"))
                    .await;
                return;
            }
        };
        if let Some(session) = self.registry.get_mut(peer) {
            session.link = Some(link.clone());
        }

        match link.create_offer().await {
            Ok(sdp) => {
                self.set_state(peer, NegotiationState::OfferSent);
                self.signaling
                    .send(SignalMessage::Offer {
                        peer: peer.clone(),
                        sdp,
                    })
                    .await;
            }
            Err(e) => {
                self.fail_negotiation(peer, &format!("create offer: {e}"))
                    .await;
            }
        }
    }

    async fn handle_offer(&mut self, peer: ParticipantId, sdp: String) {
        let Some(local) = self.local.clone() else {
            warn!(%peer, "offer before welcome, dropping");
            return;
        };
        if peer == local.id {
            warn!(%peer, "offer from our own id, dropping");
            return;
        }

        match self.registry.get(&peer).map(|s| s.state) {
            None => {
                // First sight of this id; the offer itself creates the
                // session. The snapshot will fill in the display name.
                let placeholder: String = peer.0.chars().take(6).collect();
                self.registry.create(Participant::new(peer.clone(), placeholder));
                self.sync_view(&peer);
            }
            Some(NegotiationState::Idle) => {}
            Some(NegotiationState::OfferSent) => {
                if answers_glare(&local.id, &peer) {
                    info!(%peer, "offer glare, discarding our offer and answering");
                    // Our link already holds a local offer; answer on a
                    // fresh one instead of rolling back.
                    self.factory.release(&peer).await;
                    if let Some(session) = self.registry.get_mut(&peer) {
                        session.link = None;
                        session.remote_description_set = false;
                    }
                } else {
                    info!(%peer, "offer glare, keeping our own offer");
                    return;
                }
            }
            Some(state) => {
                warn!(%peer, ?state, "unexpected offer, dropping");
                return;
            }
        }

        self.accept_offer(&peer, sdp).await;
    }

    async fn accept_offer(&mut self, peer: &ParticipantId, sdp: String) {
        let link = match self.factory.acquire(peer).await {
            Ok(link) => link,
            Err(e) => {
                self.fail_negotiation(peer, &format!("link construction: {e:#}"))
                    .await;
                return;
            }
        };
        if let Some(session) = self.registry.get_mut(peer) {
            session.link = Some(link.clone());
        }
        self.set_state(peer, NegotiationState::OfferReceived);

        if let Err(e) = link.set_remote_offer(sdp).await {
            self.fail_negotiation(peer, &format!("apply remote offer: {e}"))
                .await;
            return;
        }
        if let Some(session) = self.registry.get_mut(peer) {
            session.remote_description_set = true;
        }

        match link.create_answer().await {
            Ok(sdp) => {
                self.set_state(peer, NegotiationState::AnswerSent);
                self.signaling
                    .send(SignalMessage::Answer {
                        peer: peer.clone(),
                        sdp,
                    })
                    .await;
                // The local answer is applied, so the exchange is complete.
                self.set_state(peer, NegotiationState::Stable);
                self.drain_hints(peer).await;
                self.signaling
                    .send(SignalMessage::MediaStateRequest { peer: peer.clone() })
                    .await;
            }
            Err(e) => {
                self.fail_negotiation(peer, &format!("create answer: {e}"))
                    .await;
            }
        }
    }

    async fn handle_answer(&mut self, peer: ParticipantId, sdp: String) {
        match self.registry.get(&peer).map(|s| (s.state, s.link.clone())) {
            Some((NegotiationState::OfferSent, Some(link))) => {
                if let Err(e) = link.set_remote_answer(sdp).await {
                    self.fail_negotiation(&peer, &format!("apply remote answer: {e}"))
                        .await;
                    return;
                }
                if let Some(session) = self.registry.get_mut(&peer) {
                    session.remote_description_set = true;
                }
                self.set_state(&peer, NegotiationState::Stable);
                self.drain_hints(&peer).await;
            }
            Some((NegotiationState::OfferSent, None)) => {
                self.fail_negotiation(&peer, "answer arrived with no link")
                    .await;
            }
            Some((state, _)) => {
                warn!(%peer, ?state, "unexpected answer, dropping");
            }
            None => {
                warn!(%peer, "answer for unknown participant, dropping");
            }
        }
    }

    async fn handle_hint(&mut self, peer: ParticipantId, payload: HintPayload) {
        let Some(session) = self.registry.get_mut(&peer) else {
            warn!(%peer, "hint for unknown participant, dropping");
            return;
        };

        if !session.remote_description_set {
            debug!(%peer, "queueing hint until a remote description is applied");
            session.pending_hints.enqueue(payload);
            return;
        }

        let link = session.link.clone();
        if let Some(link) = link {
            if let Err(e) = link.apply_hint(payload).await {
                warn!(%peer, error = %e, "failed to apply hint");
            }
        }
    }

    async fn drain_hints(&mut self, peer: &ParticipantId) {
        let (hints, link) = match self.registry.get_mut(peer) {
            Some(session) => (session.pending_hints.drain(), session.link.clone()),
            None => return,
        };
        let Some(link) = link else { return };

        for hint in hints {
            if let Err(e) = link.apply_hint(hint).await {
                warn!(%peer, error = %e, "failed to apply queued hint");
            }
        }
    }

    /// Flip a local capture kind, mirror it in the view, and broadcast the
    /// combined state to the room.
    pub async fn set_local_media(
        &mut self,
        kind: MediaKind,
        enabled: bool,
    ) -> Result<(), SessionError> {
        if !self.media_source.is_available() {
            return Err(SessionError::MediaUnavailable);
        }

        self.media_source.set_enabled(kind, enabled);
        self.local_media.set(kind, enabled);

        if let Some(local) = &self.local {
            if let Some(mut entry) = self.view.get_mut(&local.id) {
                entry.media = self.local_media;
            }
        }

        self.signaling
            .send(SignalMessage::MediaState {
                peer: ParticipantId::broadcast(),
                audio: self.local_media.audio,
                video: self.local_media.video,
            })
            .await;
        Ok(())
    }

    fn handle_remote_media_state(&mut self, peer: ParticipantId, audio: bool, video: bool) {
        let Some(session) = self.registry.get_mut(&peer) else {
            debug!(%peer, "media state for unknown participant, ignoring");
            return;
        };
        session.media = MediaState { audio, video };
        self.sync_view(&peer);
    }

    /// Directed reply with our current state; sent when a peer asks.
    async fn announce_media_state(&self, requester: ParticipantId) {
        self.signaling
            .send(SignalMessage::MediaState {
                peer: requester,
                audio: self.local_media.audio,
                video: self.local_media.video,
            })
            .await;
    }

    pub async fn request_video_mute(&mut self, peer: ParticipantId, mute: bool) {
        if !self.registry.contains(&peer) {
            warn!(%peer, "mute request for unknown participant, ignoring");
            return;
        }
        // Fire-and-forget: local_mute_requested is only set by the ack.
        self.signaling
            .send(SignalMessage::VideoMuteRequest { peer, mute })
            .await;
    }

    async fn handle_video_mute_request(&mut self, peer: ParticipantId, mute: bool) {
        let Some(session) = self.registry.get_mut(&peer) else {
            warn!(%peer, "video mute request from unknown participant, dropping");
            return;
        };
        session.remote_mute_requested = mute;
        let link = session.link.clone();

        if let Some(link) = link {
            // Only the track sent to this one peer; everyone else is
            // unaffected.
            if let Err(e) = link.set_outbound_video(!mute).await {
                warn!(%peer, error = %e, "failed to adjust outbound video");
            }
        }
        self.sync_view(&peer);

        self.signaling
            .send(SignalMessage::VideoMuteResponse { peer, mute })
            .await;
    }

    fn handle_video_mute_response(&mut self, peer: ParticipantId, mute: bool) {
        let Some(session) = self.registry.get_mut(&peer) else {
            debug!(%peer, "mute response from unknown participant, ignoring");
            return;
        };
        session.local_mute_requested = mute;
        self.sync_view(&peer);
    }

    async fn fail_negotiation(&mut self, peer: &ParticipantId, reason: &str) {
        error!(%peer, reason, "negotiation failed, closing session");
        self.teardown(peer, "negotiation failure").await;
    }

    /// Destroy the session: mark it closed, release its link, drop its
    /// queue, and remove it from the view. The color assignment stays.
    async fn teardown(&mut self, peer: &ParticipantId, reason: &str) {
        let Some(mut session) = self.registry.remove(peer) else {
            debug!(%peer, "teardown for unknown participant, ignoring");
            return;
        };
        session.state = NegotiationState::Closed;

        let dropped = session.pending_hints.drain().len();
        if dropped > 0 {
            debug!(%peer, dropped, "discarding queued hints");
        }

        self.factory.release(peer).await;
        self.view.remove(peer);
        info!(%peer, reason, "session torn down");
    }

    async fn shutdown(&mut self) {
        info!("closing all sessions");
        for id in self.registry.ids() {
            self.teardown(&id, "engine shutdown").await;
        }
        self.factory.release_all().await;
        self.media_source.stop();
        self.view.clear();
    }

    fn set_state(&mut self, peer: &ParticipantId, state: NegotiationState) {
        if let Some(session) = self.registry.get_mut(peer) {
            session.state = state;
        }
        self.sync_view(peer);
    }

    fn sync_view(&self, peer: &ParticipantId) {
        let Some(session) = self.registry.get(peer) else {
            return;
        };
        let color = self
            .registry
            .color_of(peer)
            .unwrap_or_else(|| huddle_core::ColorTag::for_participant(peer));
        let tracks = self
            .view
            .get(peer)
            .map(|entry| entry.tracks.clone())
            .unwrap_or_default();

        self.view.insert(
            peer.clone(),
            PeerView {
                participant: session.participant.clone(),
                color,
                media: session.media,
                negotiation: session.state,
                remote_mute_requested: session.remote_mute_requested,
                local_mute_requested: session.local_mute_requested,
                tracks,
            },
        );
    }
}
