use huddle_core::MediaKind;
use std::sync::atomic::{AtomicBool, Ordering};

/// Boundary to the shared local capture source.
///
/// Every peer link sends the same capture tracks, so flipping a kind here
/// affects what all peers receive. Device acquisition itself lives outside
/// the engine; an unavailable source just puts the engine in receive-only
/// mode.
pub trait LocalMediaSource: Send + Sync {
    fn is_available(&self) -> bool;
    fn is_enabled(&self, kind: MediaKind) -> bool;
    fn set_enabled(&self, kind: MediaKind, enabled: bool);
    /// Stop capture entirely; called once on engine shutdown.
    fn stop(&self);
}

/// Flag-backed source for a capture pipeline that polls `is_enabled` before
/// writing samples into the shared local tracks.
pub struct StaticMediaSource {
    audio: AtomicBool,
    video: AtomicBool,
    stopped: AtomicBool,
}

impl StaticMediaSource {
    pub fn new() -> Self {
        Self {
            audio: AtomicBool::new(true),
            video: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for StaticMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMediaSource for StaticMediaSource {
    fn is_available(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio.load(Ordering::SeqCst),
            MediaKind::Video => self.video.load(Ordering::SeqCst),
        }
    }

    fn set_enabled(&self, kind: MediaKind, enabled: bool) {
        match kind {
            MediaKind::Audio => self.audio.store(enabled, Ordering::SeqCst),
            MediaKind::Video => self.video.store(enabled, Ordering::SeqCst),
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.audio.store(false, Ordering::SeqCst);
        self.video.store(false, Ordering::SeqCst);
    }
}

/// No capture at all; the engine runs receive-only.
pub struct NoMedia;

impl LocalMediaSource for NoMedia {
    fn is_available(&self) -> bool {
        false
    }

    fn is_enabled(&self, _kind: MediaKind) -> bool {
        false
    }

    fn set_enabled(&self, _kind: MediaKind, _enabled: bool) {}

    fn stop(&self) {}
}
