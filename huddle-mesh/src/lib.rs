pub mod engine;
pub mod error;
pub mod link;
pub mod media;
pub mod session;
pub mod signaling;
pub mod view;

pub use engine::{EngineCommand, EngineHandles, MeshConfig, MeshEngine};
pub use error::SessionError;
pub use link::{
    LinkBuilder, LinkConfig, LinkError, LinkEvent, LinkState, PeerLink, PeerLinkFactory,
    RemoteTrackInfo, WebRtcLinkBuilder,
};
pub use media::{LocalMediaSource, NoMedia, StaticMediaSource};
pub use session::{CandidateQueue, NegotiationState, PeerSession, SessionRegistry};
pub use signaling::SignalingOutput;
pub use view::{PeerView, RoomView};
