use serde::{Deserialize, Serialize};

/// Velocity damping applied every tick in interaction-matrix mode.
pub const DEFAULT_FRICTION: f32 = 0.1;
/// Scale from summed pairwise acceleration to velocity change.
pub const DEFAULT_BASE_SPEED_FACTOR: f32 = 0.1;
/// Added to the squared distance so coincident particles never divide by zero.
pub const DEFAULT_SOFTENING: f32 = 0.01;
/// Per-tick, per-particle probability of a random event.
pub const DEFAULT_EVENT_CHANCE: f32 = 0.01;
/// Length of the "recently mutated" window, in ticks.
pub const DEFAULT_HIGHLIGHT_TICKS: u32 = 5;

/// Simulation parameters derived from the configuration, used on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    // World
    pub world_width: f32,
    pub world_height: f32,

    // Interaction-matrix integration
    pub friction: f32,
    pub base_speed_factor: f32,
    pub softening: f32,

    // Random events
    pub event_chance: f32,
    pub highlight_ticks: u32,

    // Current simulation tick
    pub time_step: u64,
}

impl SimParams {
    /// Parameters for a `width` x `height` world with every other value at its default.
    pub fn for_world(width: u32, height: u32) -> Self {
        Self {
            world_width: width as f32,
            world_height: height as f32,
            friction: DEFAULT_FRICTION,
            base_speed_factor: DEFAULT_BASE_SPEED_FACTOR,
            softening: DEFAULT_SOFTENING,
            event_chance: DEFAULT_EVENT_CHANCE,
            highlight_ticks: DEFAULT_HIGHLIGHT_TICKS,
            time_step: 0,
        }
    }

    /// Largest coordinate reachable on the x axis of the reflective (clustering) space.
    #[inline]
    pub fn max_x(&self) -> f32 {
        self.world_width - 1.0
    }

    /// Largest coordinate reachable on the y axis of the reflective (clustering) space.
    #[inline]
    pub fn max_y(&self) -> f32 {
        self.world_height - 1.0
    }
}
