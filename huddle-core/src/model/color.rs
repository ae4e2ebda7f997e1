use crate::model::ParticipantId;
use serde::Serialize;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Border palette shown around each participant's tile.
pub const PALETTE: [&str; 9] = [
    "#7986cb", // blue
    "#e57373", // red
    "#81c784", // green
    "#ffd54f", // yellow
    "#ba68c8", // purple
    "#4fc3f7", // light blue
    "#f06292", // pink
    "#4db6ac", // teal
    "#ff8a65", // orange
];

/// Visual tag for one participant, stable for the life of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColorTag(pub &'static str);

impl ColorTag {
    /// Pick a palette entry from the participant id. Deterministic, so the
    /// same id always renders with the same border.
    pub fn for_participant(id: &ParticipantId) -> Self {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let idx = (hasher.finish() % PALETTE.len() as u64) as usize;
        Self(PALETTE[idx])
    }
}
