pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, UniverseConfig, InitialConditions, EventsConfig, PhysicsConfig, TimingConfig, OutputConfig};
pub use sim_params::SimParams;
pub use snapshot::{ParticleView, Snapshot};
pub use vecmath::{Vec2, toroidal_delta, toroidal_displacement, wrap_coord, reflect_coord};
