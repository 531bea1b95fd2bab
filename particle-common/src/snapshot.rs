use serde::{Serialize, Deserialize};
use crate::vecmath::Vec2;

/// What a renderer needs to know about one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleView {
    pub position: Vec2,
    /// Row/column of the interaction matrix the particle belongs to.
    pub type_id: usize,
    /// True while the particle is inside its post-event highlight window.
    pub highlighted: bool,
}

/// A read-only copy of the particle population taken between two ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks completed when the snapshot was taken.
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    pub particles: Vec<ParticleView>,
}

impl Snapshot {
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn highlighted_count(&self) -> usize {
        self.particles.iter().filter(|p| p.highlighted).count()
    }
}
