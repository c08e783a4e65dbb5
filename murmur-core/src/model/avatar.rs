use std::fmt;

/// The selectable avatars, in wire index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Avatar {
    Horse,
    Bear,
    Pig,
    Rabbit,
}

impl Avatar {
    pub const ALL: [Avatar; 4] = [Avatar::Horse, Avatar::Bear, Avatar::Pig, Avatar::Rabbit];

    /// Indices outside the table wrap around.
    pub fn from_index(idx: u32) -> Self {
        Self::ALL[idx as usize % Self::ALL.len()]
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Self {
        Self::from_index(self.index() + Self::ALL.len() as u32 - 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Avatar::Horse => "Horse",
            Avatar::Bear => "Bear",
            Avatar::Pig => "Pig",
            Avatar::Rabbit => "Rabbit",
        }
    }

    /// Nickname shown for a participant who left the name blank.
    pub fn anonymous_nickname(self) -> String {
        format!("Anonymous {}", self.name())
    }

    pub fn resolve_nickname(self, nickname: &str) -> String {
        if nickname.is_empty() {
            self.anonymous_nickname()
        } else {
            nickname.to_owned()
        }
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
