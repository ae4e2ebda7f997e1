mod factory;
mod webrtc_link;

pub use factory::PeerLinkFactory;
pub use webrtc_link::{LinkConfig, WebRtcLinkBuilder};

use async_trait::async_trait;
use huddle_core::{HintPayload, MediaKind, ParticipantId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Coarse connection state of one peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Descriptor for an inbound media track, surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub kind: MediaKind,
    pub track_id: String,
}

/// Events a link emits back into the engine loop.
#[derive(Debug)]
pub enum LinkEvent {
    /// The link produced a local connectivity hint to relay to the peer.
    LocalHint(ParticipantId, HintPayload),
    /// An inbound media track arrived.
    RemoteTrack(ParticipantId, RemoteTrackInfo),
    /// The underlying connection changed state.
    StateChanged(ParticipantId, LinkState),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link is closed")]
    Closed,
    #[error("description rejected: {0}")]
    Description(String),
    #[error("hint rejected: {0}")]
    Hint(String),
}

/// One negotiated point-to-point connection toward a single remote peer.
///
/// `create_offer` and `create_answer` also apply the produced description
/// locally, so a successful call leaves the link ready for the counterpart
/// description.
#[async_trait]
pub trait PeerLink: Send + Sync {
    async fn create_offer(&self) -> Result<String, LinkError>;
    async fn create_answer(&self) -> Result<String, LinkError>;
    async fn set_remote_offer(&self, sdp: String) -> Result<(), LinkError>;
    async fn set_remote_answer(&self, sdp: String) -> Result<(), LinkError>;
    async fn apply_hint(&self, hint: HintPayload) -> Result<(), LinkError>;
    /// Enable or disable only the video sent to this one peer.
    async fn set_outbound_video(&self, enabled: bool) -> Result<(), LinkError>;
    async fn close(&self);
}

/// Constructs raw links; the factory layers idempotence on top.
#[async_trait]
pub trait LinkBuilder: Send + Sync {
    async fn build(
        &self,
        peer: ParticipantId,
        events: mpsc::Sender<LinkEvent>,
    ) -> anyhow::Result<Arc<dyn PeerLink>>;
}
