use huddle_core::{MediaKind, ParticipantId};

/// User intents arriving from the presentation layer.
#[derive(Debug)]
pub enum EngineCommand {
    /// Flip the local track of the given kind and broadcast the new state.
    ToggleMedia { kind: MediaKind },

    /// Set the local track of the given kind explicitly.
    SetMedia { kind: MediaKind, enabled: bool },

    /// Ask one peer to stop (or resume) sending us video.
    RequestVideoMute { peer: ParticipantId, mute: bool },

    /// Leave the room and shut the engine down.
    Leave,
}
