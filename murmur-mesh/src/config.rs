use crate::error::MeshError;
use crate::transport::TransportConfig;
use murmur_core::utils::{DEFAULT_MAX_SOUND_DISTANCE, DEFAULT_NICKNAME, DEFAULT_VELOCITY};
use murmur_core::{Position, RoomId};

/// What to do with a remote candidate that arrives for an identity the
/// registry has no description for yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IceCandidatePolicy {
    /// Ignore it. Browsers in the same room behave this way.
    #[default]
    Drop,
    /// Queue it per identity and apply it once the remote description is set.
    Buffer,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room: RoomId,
    pub nickname: String,
    pub avatar: u32,
    pub spawn: Position,
    /// Plane units per millisecond.
    pub velocity: f64,
    pub max_sound_distance: f64,
    pub candidate_policy: IceCandidatePolicy,
    pub transport: TransportConfig,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), MeshError> {
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            return Err(MeshError::InvalidConfig(format!(
                "velocity must be a non-negative number, got {}",
                self.velocity
            )));
        }
        if !self.max_sound_distance.is_finite() || self.max_sound_distance <= 0.0 {
            return Err(MeshError::InvalidConfig(format!(
                "max sound distance must be positive, got {}",
                self.max_sound_distance
            )));
        }
        if !self.spawn.x.is_finite() || !self.spawn.y.is_finite() {
            return Err(MeshError::InvalidConfig("spawn position is not finite".into()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room: RoomId::default(),
            nickname: DEFAULT_NICKNAME.to_owned(),
            avatar: 0,
            spawn: Position::default(),
            velocity: DEFAULT_VELOCITY,
            max_sound_distance: DEFAULT_MAX_SOUND_DISTANCE,
            candidate_policy: IceCandidatePolicy::default(),
            transport: TransportConfig::default(),
        }
    }
}
