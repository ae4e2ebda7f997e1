use serde::{Deserialize, Serialize};
use std::fmt;

/// Special target id for media-state messages addressed to the whole room.
const BROADCAST_ID: &str = "send_to_all";

/// Opaque participant identifier assigned by the signaling channel.
///
/// Ids are compared lexicographically; the glare tie-break relies on this
/// ordering being total and identical on both sides.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// The reserved id addressing every participant at once.
    pub fn broadcast() -> Self {
        Self(BROADCAST_ID.to_string())
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == BROADCAST_ID
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One member of a room as announced by the signaling channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
