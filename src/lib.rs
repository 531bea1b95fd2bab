pub mod events;
pub mod forces;
pub mod interaction;
pub mod particle;
pub mod render;
pub mod simulation;
pub mod statistics;

pub use events::{EventKind, EventSink};
pub use interaction::{interaction_matrix, InteractionMatrix, Preset};
pub use particle::{Particle, ParticleStore};
pub use simulation::{ForceLaw, Simulation};
pub use statistics::{Statistics, Summary};
