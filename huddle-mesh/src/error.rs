use huddle_core::ParticipantId;
use thiserror::Error;

/// Failure taxonomy for the session engine.
///
/// Only `MediaUnavailable` is ever surfaced to the embedding layer; the
/// rest are handled locally and logged with the participant id.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A message addressed an id with no live session.
    #[error("no live session for participant {0}")]
    UnknownParticipant(ParticipantId),

    /// A description create/apply step failed; the session is closed.
    #[error("negotiation with {id} failed: {reason}")]
    Negotiation { id: ParticipantId, reason: String },

    /// The local capture source has no usable tracks.
    #[error("local media source unavailable")]
    MediaUnavailable,
}
