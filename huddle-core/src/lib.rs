pub mod model;

pub use model::{
    ColorTag, HintPayload, MediaKind, MediaState, Participant, ParticipantId, SignalMessage,
};
