use crate::local::Microphone;
use murmur_core::{Avatar, Participant, ParticipantState, Position};

/// The participant on this machine: the published state plus the input and
/// audio handles that drive it.
pub struct LocalParticipant {
    state: ParticipantState,
    velocity: f64,
    direction: Position,
    touch_start: Position,
    touching: Position,
    moving: bool,
    microphone: Microphone,
    spectrum: Vec<u8>,
}

impl LocalParticipant {
    pub fn new(
        nickname: &str,
        avatar: u32,
        position: Position,
        velocity: f64,
        microphone: Microphone,
    ) -> Self {
        let avatar = Avatar::from_index(avatar);

        Self {
            state: ParticipantState {
                nickname: avatar.resolve_nickname(nickname),
                avatar: avatar.index(),
                position,
                rotation: 0.0,
                volume: 0.0,
            },
            velocity,
            direction: Position::new(0.0, 1.0),
            touch_start: Position::default(),
            touching: Position::default(),
            moving: false,
            microphone,
            spectrum: Vec::new(),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn microphone(&self) -> &Microphone {
        &self.microphone
    }

    /// Starts a drag. The drag vector is zero until the pointer moves.
    pub fn pointer_down(&mut self, at: Position) {
        self.moving = true;
        self.touch_start = at;
        self.touching = at;
    }

    pub fn pointer_move(&mut self, at: Position) {
        self.touching = at;
    }

    pub fn pointer_up(&mut self) {
        self.moving = false;
    }

    pub fn set_profile(&mut self, avatar: u32, nickname: &str) {
        let avatar = Avatar::from_index(avatar);
        self.state.avatar = avatar.index();
        self.state.nickname = avatar.resolve_nickname(nickname);
    }

    pub fn set_mic_enabled(&mut self, enabled: bool) {
        self.microphone.set_enabled(enabled);
    }

    /// Advances one frame of `elapsed_ms` milliseconds.
    pub fn update(&mut self, elapsed_ms: f64) {
        if self.moving {
            if let Some(direction) = (self.touching - self.touch_start).normalized() {
                self.direction = direction;
                self.state.position = self.state.position + direction * (self.velocity * elapsed_ms);
            }
        }

        self.state.volume = self.microphone.level(&mut self.spectrum);

        // Rotation 0 faces +y.
        self.state.rotation = self.direction.x.atan2(self.direction.y);
    }

    pub fn snapshot(&self) -> ParticipantState {
        self.state.clone()
    }
}

impl Participant for LocalParticipant {
    fn state(&self) -> &ParticipantState {
        &self.state
    }
}
