use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::{
    SimParams, DEFAULT_BASE_SPEED_FACTOR, DEFAULT_EVENT_CHANCE, DEFAULT_FRICTION,
    DEFAULT_HIGHLIGHT_TICKS, DEFAULT_SOFTENING,
};
use std::ops::RangeInclusive;
use std::path::Path;

/// Preset identifiers the engine knows how to run (four matrix presets plus clustering).
pub const PRESET_IDS: RangeInclusive<u32> = 1..=5;

/// Smallest world edge the engine accepts once the size has been resolved.
pub const MIN_WORLD_EDGE: u32 = 2;

// Size of the simulation space; zero means "use the terminal size"
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UniverseConfig {
    pub width: u32,
    pub height: u32,
}

impl UniverseConfig {
    /// True once both edges are known (non-zero).
    pub fn is_resolved(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Fills any zero edge from the given terminal size.
    pub fn resolve_with(&mut self, terminal_cols: u16, terminal_rows: u16) {
        if self.width == 0 {
            self.width = u32::from(terminal_cols);
        }
        if self.height == 0 {
            self.height = u32::from(terminal_rows);
        }
    }
}

// Population created at every reset
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct InitialConditions {
    pub particle_count: u32,
    pub preset: u32,
    /// Fixed RNG seed; `None` draws fresh OS entropy at every reset.
    pub seed: Option<u64>,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            particle_count: 200,
            preset: 1,
            seed: None,
        }
    }
}

// Random event injection
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct EventsConfig {
    pub enabled: bool,
    pub chance: f32,
    pub highlight_ticks: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            chance: DEFAULT_EVENT_CHANCE,
            highlight_ticks: DEFAULT_HIGHLIGHT_TICKS,
        }
    }
}

// Interaction-matrix integration constants
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PhysicsConfig {
    pub friction: f32,
    pub base_speed_factor: f32,
    pub softening: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            base_speed_factor: DEFAULT_BASE_SPEED_FACTOR,
            softening: DEFAULT_SOFTENING,
        }
    }
}

// Tick cadence of the interactive loop
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub max_ticks: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            max_ticks: None,
        }
    }
}

// Where the end-of-run statistics go
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub stats_csv: Option<String>,
    pub stats_json: Option<String>,
    pub print_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stats_csv: Some("statistics.csv".to_string()),
            stats_json: None,
            print_summary: true,
        }
    }
}

// Main simulation configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub universe: UniverseConfig,
    pub initial_conditions: InitialConditions,
    pub events: EventsConfig,
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to load config from '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that do not depend on the terminal.
    ///
    /// A zero universe edge is allowed here; it is resolved from the terminal later and
    /// checked again by [`SimulationConfig::validate_resolved`].
    pub fn validate(&self) -> Result<()> {
        if self.initial_conditions.particle_count == 0 {
            anyhow::bail!("particle_count must be greater than 0.");
        }
        if !PRESET_IDS.contains(&self.initial_conditions.preset) {
            anyhow::bail!(
                "preset must be in {}..={}, got {}.",
                PRESET_IDS.start(),
                PRESET_IDS.end(),
                self.initial_conditions.preset
            );
        }
        if !(0.0..=1.0).contains(&self.events.chance) {
            anyhow::bail!("events.chance must be within [0, 1].");
        }
        if !(0.0..=1.0).contains(&self.physics.friction) {
            anyhow::bail!("physics.friction must be within [0, 1].");
        }
        let softening = self.physics.softening;
        if softening.is_nan() || softening < 0.0 || !self.physics.base_speed_factor.is_finite() {
            anyhow::bail!("physics.softening must be non-negative and base_speed_factor finite.");
        }
        for (name, edge) in [("width", self.universe.width), ("height", self.universe.height)] {
            if edge != 0 && edge < MIN_WORLD_EDGE {
                anyhow::bail!("universe.{} must be 0 (terminal size) or at least {}.", name, MIN_WORLD_EDGE);
            }
        }
        Ok(())
    }

    /// Validates everything, including a universe size that must be known by now.
    pub fn validate_resolved(&self) -> Result<()> {
        self.validate()?;
        if !self.universe.is_resolved() {
            anyhow::bail!("universe size is still unresolved.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let mut params = SimParams::for_world(self.universe.width, self.universe.height);
        params.friction = self.physics.friction;
        params.base_speed_factor = self.physics.base_speed_factor;
        params.softening = self.physics.softening;
        params.event_chance = self.events.chance;
        params.highlight_ticks = self.events.highlight_ticks;
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() -> Result<()> {
        let config = SimulationConfig::from_toml_str("")?;
        assert_eq!(config.initial_conditions.particle_count, 200);
        assert_eq!(config.initial_conditions.preset, 1);
        assert!(!config.events.enabled);
        assert_eq!(config.events.highlight_ticks, 5);
        assert_eq!(config.timing.tick_ms, 50);
        assert!(!config.universe.is_resolved());
        Ok(())
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() -> Result<()> {
        let config = SimulationConfig::from_toml_str(
            r#"
            [universe]
            width = 120

            [initial_conditions]
            preset = 5
            seed = 42

            [events]
            enabled = true
            "#,
        )?;
        assert_eq!(config.universe.width, 120);
        assert_eq!(config.universe.height, 0);
        assert_eq!(config.initial_conditions.seed, Some(42));
        assert!(config.events.enabled);
        assert!((config.events.chance - 0.01).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = SimulationConfig::from_toml_str("[initial_conditions]\npreset = 9\n").unwrap_err();
        assert!(err.to_string().contains("preset"));

        let err = SimulationConfig::from_toml_str("[initial_conditions]\nparticle_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("particle_count"));

        let err = SimulationConfig::from_toml_str("[events]\nchance = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("chance"));

        let err = SimulationConfig::from_toml_str("[universe]\nwidth = 1\n").unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn resolve_fills_only_missing_edges() -> Result<()> {
        let mut config = SimulationConfig::default();
        config.universe.height = 30;
        assert!(config.validate_resolved().is_err());
        config.universe.resolve_with(100, 40);
        assert_eq!((config.universe.width, config.universe.height), (100, 30));
        config.validate_resolved()?;

        let params = config.get_sim_params();
        assert_eq!(params.world_width, 100.0);
        assert_eq!(params.max_y(), 29.0);
        Ok(())
    }

    #[test]
    fn shipped_config_file_parses() -> Result<()> {
        let config = SimulationConfig::from_toml_str(include_str!("../../config.toml"))?;
        assert!(config.events.enabled);
        assert_eq!(config.output.stats_csv.as_deref(), Some("statistics.csv"));
        Ok(())
    }
}
