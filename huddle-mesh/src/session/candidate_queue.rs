use huddle_core::HintPayload;
use std::collections::VecDeque;

/// FIFO buffer for connectivity hints that arrived before the session had a
/// remote description to apply them against.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    hints: VecDeque<HintPayload>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, hint: HintPayload) {
        self.hints.push_back(hint);
    }

    /// Take every queued hint, oldest first, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<HintPayload> {
        self.hints.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}
