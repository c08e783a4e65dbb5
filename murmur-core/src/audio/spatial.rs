use crate::model::Position;

/// Linear distance attenuation: 1 at the source, 0 at `max_distance` and beyond.
pub fn gain(distance: f64, max_distance: f64) -> f64 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAudioMixer {
    max_distance: f64,
}

impl SpatialAudioMixer {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    pub fn gain_between(&self, listener: Position, source: Position) -> f64 {
        gain(listener.distance(&source), self.max_distance)
    }
}
