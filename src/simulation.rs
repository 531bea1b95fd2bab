use crate::forces::{init_group, reset_particles, simulate, update_group};
use crate::interaction::{InteractionMatrix, Preset};
use crate::particle::{Particle, ParticleStore};
use crate::statistics::{Statistics, Summary};
use anyhow::Result;
use log::{debug, info};
use particle_common::{ParticleView, SimParams, SimulationConfig, Snapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The force law a run uses, chosen once from the preset.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceLaw {
    /// Pairwise forces scaled by the matrix, in toroidal space, with random events.
    InteractionMatrix(InteractionMatrix),
    /// Same-type attraction and soft collisions in a walled box.
    Clustering,
}

impl ForceLaw {
    pub fn for_preset(preset: Preset) -> Self {
        if preset.uses_clustering_law() {
            ForceLaw::Clustering
        } else {
            ForceLaw::InteractionMatrix(preset.matrix())
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForceLaw::InteractionMatrix(_) => "interaction-matrix",
            ForceLaw::Clustering => "clustering",
        }
    }
}

/// Manages the particle population and runs it tick by tick.
pub struct Simulation {
    /// The simulation configuration, with the universe size already resolved.
    config: SimulationConfig,
    params: SimParams,
    preset: Preset,
    law: ForceLaw,
    store: ParticleStore,
    /// Re-created on every reset: from the configured seed if any, OS entropy otherwise.
    rng: StdRng,
    stats: Statistics,
    /// Number of completed ticks since the last reset.
    current_tick: u64,
}

fn fresh_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl Simulation {
    /// Creates a run from a configuration whose universe size is known.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate_resolved()?;
        let preset = Preset::from_id(config.initial_conditions.preset)
            .ok_or_else(|| anyhow::anyhow!("unknown preset {}", config.initial_conditions.preset))?;
        let law = ForceLaw::for_preset(preset);
        let params = config.get_sim_params();
        let count = config.initial_conditions.particle_count as usize;

        let mut sim = Self {
            rng: fresh_rng(config.initial_conditions.seed),
            stats: Statistics::new(count),
            store: ParticleStore::with_capacity(count),
            config,
            params,
            preset,
            law,
            current_tick: 0,
        };
        sim.populate();
        info!(
            "Simulation ready: preset {}, {} law, {} particles in {}x{}, random events {}.",
            sim.preset,
            sim.law.name(),
            sim.store.len(),
            sim.config.universe.width,
            sim.config.universe.height,
            if sim.events_enabled() { "on" } else { "off" }
        );
        Ok(sim)
    }

    fn populate(&mut self) {
        let count = self.config.initial_conditions.particle_count as usize;
        match self.law {
            ForceLaw::InteractionMatrix(_) => reset_particles(&mut self.store, count, &self.params, &mut self.rng),
            ForceLaw::Clustering => init_group(&mut self.store, count, &self.params, &mut self.rng),
        }
    }

    /// Starts over: new random source, new population, cleared statistics.
    pub fn reset(&mut self) {
        self.rng = fresh_rng(self.config.initial_conditions.seed);
        self.current_tick = 0;
        self.params.time_step = 0;
        self.populate();
        self.stats.reset(self.store.len());
        info!("Simulation reset with {} particles.", self.store.len());
    }

    /// Advances the run by one tick.
    pub fn step(&mut self) {
        self.params.time_step = self.current_tick;
        let before = self.store.len();

        match &self.law {
            ForceLaw::InteractionMatrix(matrix) => {
                let events_enabled = self.config.events.enabled;
                simulate(&mut self.store, matrix, &self.params, events_enabled, &mut self.rng, &mut self.stats);
            }
            ForceLaw::Clustering => update_group(&mut self.store, &self.params),
        }

        let after = self.store.len();
        if after != before {
            debug!("Tick {}: population {} -> {}.", self.current_tick, before, after);
        }

        self.stats.record_step(after);
        self.current_tick += 1;
    }

    /// Runs `ticks` steps back to back.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Read-only copy of what a renderer needs.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.current_tick,
            width: self.config.universe.width,
            height: self.config.universe.height,
            particles: self
                .store
                .iter()
                .map(|p| ParticleView {
                    position: p.position,
                    type_id: p.type_id,
                    highlighted: p.is_highlighted(),
                })
                .collect(),
        }
    }

    /// End-of-run report over the current population.
    pub fn summary(&self) -> Option<Summary> {
        Summary::compute(&self.stats, self.store.as_slice())
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.as_slice()
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn tick(&self) -> u64 {
        self.current_tick
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn law(&self) -> &ForceLaw {
        &self.law
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Random events only ever run under the interaction-matrix law.
    pub fn events_enabled(&self) -> bool {
        self.config.events.enabled && matches!(self.law, ForceLaw::InteractionMatrix(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn config(preset: u32, count: u32, events: bool) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.universe.width = 60;
        config.universe.height = 25;
        config.initial_conditions.preset = preset;
        config.initial_conditions.particle_count = count;
        config.initial_conditions.seed = Some(99);
        config.events.enabled = events;
        config
    }

    #[test]
    fn preset_selects_the_law() -> Result<()> {
        let sim = Simulation::new(config(5, 10, true))?;
        assert_eq!(sim.law(), &ForceLaw::Clustering);
        assert!(!sim.events_enabled());
        assert!(sim.particles().iter().all(|p| p.mass == 1.0));

        let sim = Simulation::new(config(2, 10, true))?;
        assert_eq!(sim.law(), &ForceLaw::InteractionMatrix(Preset::Stratification.matrix()));
        assert!(sim.events_enabled());
        Ok(())
    }

    #[test]
    fn unresolved_universe_is_rejected() {
        let mut cfg = config(1, 10, false);
        cfg.universe.width = 0;
        assert!(Simulation::new(cfg).is_err());
    }

    #[test]
    fn seeded_runs_repeat_after_reset() -> Result<()> {
        let mut sim = Simulation::new(config(3, 40, true))?;
        sim.run(30);
        let first: Vec<Particle> = sim.particles().to_vec();
        let first_events = sim.statistics().total_random_events;

        sim.reset();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.statistics().simulation_steps, 0);
        sim.run(30);
        assert_eq!(sim.particles(), first.as_slice());
        assert_eq!(sim.statistics().total_random_events, first_events);
        Ok(())
    }

    #[test]
    fn clustering_never_reports_events() -> Result<()> {
        let mut cfg = config(5, 30, true);
        cfg.events.chance = 1.0;
        let mut sim = Simulation::new(cfg)?;
        sim.run(20);
        assert_eq!(sim.particle_count(), 30);
        assert_eq!(sim.statistics().total_random_events, 0);
        assert_eq!(sim.statistics().simulation_steps, 20);
        Ok(())
    }

    #[test]
    fn events_feed_the_statistics() -> Result<()> {
        let mut cfg = config(1, 50, true);
        cfg.events.chance = 0.5;
        let mut sim = Simulation::new(cfg)?;
        sim.run(10);
        let stats = sim.statistics();
        let by_kind: u64 = EventKind::ALL.iter().map(|&k| stats.event_count(k)).sum();
        assert!(stats.total_random_events > 0);
        assert_eq!(by_kind, stats.total_random_events);
        let removed = stats.event_count(EventKind::Removal) as i64;
        let born = stats.event_count(EventKind::Reproduction) as i64;
        assert_eq!(sim.particle_count() as i64, 50 - removed + born);
        Ok(())
    }

    #[test]
    fn snapshot_mirrors_the_store() -> Result<()> {
        let mut sim = Simulation::new(config(4, 12, false))?;
        sim.step();
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!((snap.width, snap.height), (60, 25));
        assert_eq!(snap.particle_count(), 12);
        for (view, p) in snap.particles.iter().zip(sim.particles()) {
            assert_eq!(view.position, p.position);
            assert_eq!(view.type_id, p.type_id);
            assert_eq!(view.highlighted, p.is_highlighted());
        }
        assert!(sim.summary().is_some());
        Ok(())
    }
}
