use crate::link::PeerLink;
use crate::session::{CandidateQueue, NegotiationState};
use huddle_core::{ColorTag, MediaState, Participant, ParticipantId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::debug;

/// Everything the engine tracks for one remote participant.
pub struct PeerSession {
    pub participant: Participant,
    pub state: NegotiationState,
    pub link: Option<Arc<dyn PeerLink>>,
    pub pending_hints: CandidateQueue,
    /// Set once a remote description was applied; from then on hints go
    /// straight to the link and the queue stays empty.
    pub remote_description_set: bool,
    pub media: MediaState,
    /// This peer asked us to stop sending them video.
    pub remote_mute_requested: bool,
    /// We asked this peer to stop sending us video (set on their ack).
    pub local_mute_requested: bool,
}

impl PeerSession {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            state: NegotiationState::Idle,
            link: None,
            pending_hints: CandidateQueue::new(),
            remote_description_set: false,
            media: MediaState::default(),
            remote_mute_requested: false,
            local_mute_requested: false,
        }
    }
}

/// Single owner of every `PeerSession` and of the per-id color assignment.
///
/// Colors outlive sessions on purpose: an id that drops out and rejoins the
/// room keeps its tag, so re-renders stay stable.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<ParticipantId, PeerSession>,
    colors: HashMap<ParticipantId, ColorTag>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for the participant, or hand back the existing one.
    /// Duplicate creation attempts resolve by reuse, never by replacement.
    pub fn create(&mut self, participant: Participant) -> &mut PeerSession {
        let id = participant.id.clone();
        self.colors
            .entry(id.clone())
            .or_insert_with(|| ColorTag::for_participant(&id));

        match self.sessions.entry(id) {
            Entry::Occupied(entry) => {
                debug!(peer = %entry.key(), "session already live, reusing");
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(PeerSession::new(participant)),
        }
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&PeerSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Remove the session; the color assignment stays.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<PeerSession> {
        self.sessions.remove(id)
    }

    /// Assign-once color lookup, usable for ids with no session (self).
    pub fn color_for(&mut self, id: &ParticipantId) -> ColorTag {
        *self
            .colors
            .entry(id.clone())
            .or_insert_with(|| ColorTag::for_participant(id))
    }

    pub fn color_of(&self, id: &ParticipantId) -> Option<ColorTag> {
        self.colors.get(id).copied()
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
