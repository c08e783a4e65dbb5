use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Point or vector on the room plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (*self - *other).length()
    }

    /// Unit vector in the same direction, `None` for the zero vector.
    pub fn normalized(&self) -> Option<Position> {
        if self.x == 0.0 && self.y == 0.0 {
            return None;
        }
        let len = self.length();
        Some(Position::new(self.x / len, self.y / len))
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}
