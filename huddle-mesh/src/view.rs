use crate::link::RemoteTrackInfo;
use crate::session::NegotiationState;
use dashmap::DashMap;
use huddle_core::{ColorTag, MediaState, Participant, ParticipantId};
use std::sync::Arc;

/// Presentation-facing snapshot of one participant, kept in step with the
/// registry by the engine. The local participant has an entry too.
#[derive(Debug, Clone)]
pub struct PeerView {
    pub participant: Participant,
    pub color: ColorTag,
    pub media: MediaState,
    pub negotiation: NegotiationState,
    pub remote_mute_requested: bool,
    pub local_mute_requested: bool,
    pub tracks: Vec<RemoteTrackInfo>,
}

/// Shared read surface for the presentation layer. The engine is the only
/// writer; readers may hold this across the room's lifetime.
pub type RoomView = Arc<DashMap<ParticipantId, PeerView>>;
