mod candidate_queue;
mod negotiation;
mod registry;

pub use candidate_queue::CandidateQueue;
pub use negotiation::{NegotiationState, answers_glare};
pub use registry::{PeerSession, SessionRegistry};
