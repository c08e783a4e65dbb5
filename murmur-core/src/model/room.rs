use crate::utils::DEFAULT_ROOM;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Falls back to the default room for a missing or empty name.
    pub fn from_optional(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.is_empty() => Self(n.to_owned()),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self(DEFAULT_ROOM.to_owned())
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self::from_optional(Some(s))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
