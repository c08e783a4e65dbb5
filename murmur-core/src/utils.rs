pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Room joined when the caller does not name one.
pub const DEFAULT_ROOM: &str = "lobby";

/// Walking speed in plane units per millisecond.
pub const DEFAULT_VELOCITY: f64 = 0.2;

/// Distance at which a remote participant becomes inaudible.
pub const DEFAULT_MAX_SOUND_DISTANCE: f64 = 500.0;

pub const DEFAULT_NICKNAME: &str = "Anonymous";

pub const ANALYSER_FFT_SIZE: usize = 1024;
pub const ANALYSER_SMOOTHING: f32 = 0.4;
pub const ANALYSER_MIN_DECIBELS: f32 = -100.0;
pub const ANALYSER_MAX_DECIBELS: f32 = -30.0;

pub const STATE_CHANNEL_LABEL: &str = "dc";

/// Candidates held per identity while waiting for its session description.
pub const MAX_BUFFERED_CANDIDATES: usize = 32;

/// Identities without an entry whose candidates are held at once.
pub const MAX_ORPHAN_PEERS: usize = 16;
