use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use webrtc::track::track_remote::TrackRemote;

/// Inbound audio of one remote peer as seen by a playback layer: the
/// remote track once it arrives, and the spatial gain to play it at.
pub struct RemoteAudio {
    gain: AtomicU64,
    track: RwLock<Option<Arc<TrackRemote>>>,
    released: AtomicBool,
}

impl RemoteAudio {
    pub fn new() -> Self {
        Self {
            gain: AtomicU64::new(1.0f64.to_bits()),
            track: RwLock::new(None),
            released: AtomicBool::new(false),
        }
    }

    pub fn gain(&self) -> f64 {
        f64::from_bits(self.gain.load(Ordering::Relaxed))
    }

    pub fn set_gain(&self, gain: f64) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn attach(&self, track: Arc<TrackRemote>) {
        if self.is_released() {
            return;
        }
        *self.track.write() = Some(track);
    }

    pub fn track(&self) -> Option<Arc<TrackRemote>> {
        self.track.read().clone()
    }

    /// Drops the track and silences the output. Later attaches are ignored.
    pub fn release(&self) {
        self.released.store(true, Ordering::Relaxed);
        self.set_gain(0.0);
        self.track.write().take();
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for RemoteAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAudio")
            .field("gain", &self.gain())
            .field("has_track", &self.track.read().is_some())
            .field("released", &self.is_released())
            .finish()
    }
}

impl Default for RemoteAudio {
    fn default() -> Self {
        Self::new()
    }
}
