use crate::model::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};

/// Opaque connectivity hint relayed between peers while a link is being
/// established. The engine never inspects the candidate string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HintPayload {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Everything that travels over the signaling channel, in both directions.
///
/// Directed messages carry a single `peer` field: the target when sent, the
/// sender after the relay rewrites it on delivery. `MediaState` sent with
/// the broadcast id is fanned out to the whole room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    /// Announce ourselves to the channel on startup.
    Join {
        room: String,
        display_name: String,
    },
    /// Channel's reply to `Join`: our assigned identity.
    Welcome {
        participant: Participant,
    },
    /// Authoritative membership list for the room.
    RoomSnapshot {
        participants: Vec<Participant>,
    },
    Offer {
        peer: ParticipantId,
        sdp: String,
    },
    Answer {
        peer: ParticipantId,
        sdp: String,
    },
    Hint {
        peer: ParticipantId,
        payload: HintPayload,
    },
    ParticipantLeft {
        peer: ParticipantId,
    },
    MediaState {
        peer: ParticipantId,
        audio: bool,
        video: bool,
    },
    MediaStateRequest {
        peer: ParticipantId,
    },
    VideoMuteRequest {
        peer: ParticipantId,
        mute: bool,
    },
    VideoMuteResponse {
        peer: ParticipantId,
        mute: bool,
    },
}
