mod color;
mod media;
mod participant;
mod signaling;

pub use color::{ColorTag, PALETTE};
pub use media::{MediaKind, MediaState};
pub use participant::{Participant, ParticipantId};
pub use signaling::{HintPayload, SignalMessage};
