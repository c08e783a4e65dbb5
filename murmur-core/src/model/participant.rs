use crate::model::position::Position;
use crate::utils::DEFAULT_NICKNAME;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The snapshot every participant publishes over its data channels.
///
/// Field names follow the browser clients so both can share a room.
/// Unknown fields are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub nickname: String,
    #[serde(rename = "idx")]
    pub avatar: u32,
    #[serde(rename = "centerPos")]
    pub position: Position,
    #[serde(rename = "rotateRadian")]
    pub rotation: f64,
    pub volume: f64,
}

impl ParticipantState {
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

impl Default for ParticipantState {
    fn default() -> Self {
        Self {
            nickname: DEFAULT_NICKNAME.to_owned(),
            avatar: 0,
            position: Position::default(),
            rotation: 0.0,
            volume: 0.0,
        }
    }
}

/// Read access shared by the local participant and every remote peer.
pub trait Participant {
    fn state(&self) -> &ParticipantState;

    fn nickname(&self) -> &str {
        &self.state().nickname
    }

    fn avatar(&self) -> u32 {
        self.state().avatar
    }

    fn position(&self) -> Position {
        self.state().position
    }

    fn rotation(&self) -> f64 {
        self.state().rotation
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }
}

impl Participant for ParticipantState {
    fn state(&self) -> &ParticipantState {
        self
    }
}
