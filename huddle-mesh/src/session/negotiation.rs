use huddle_core::ParticipantId;

/// Per-session negotiation state. Transitions happen only inside the engine
/// loop; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Stable,
    Closed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        self == NegotiationState::Closed
    }
}

/// Glare tie-break: when both sides offered at once, the side with the
/// lexicographically smaller id discards its own offer and answers the
/// remote one. Both sides evaluate this with swapped arguments and reach
/// opposite conclusions, which is what breaks the deadlock.
pub fn answers_glare(local: &ParticipantId, remote: &ParticipantId) -> bool {
    local < remote
}
