//! Run statistics: event counters fed during the run and an end-of-run summary.

use crate::events::{EventKind, EventSink};
use crate::particle::Particle;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Pairs closer than this count as a close approach in the summary.
pub const CLOSE_PAIR_DISTANCE: f64 = 2.0;
/// Edge of the square grid laid over the bounding box to find the densest cell.
pub const DENSITY_GRID_SIZE: usize = 10;
const TOP_N: usize = 3;

/// Counters accumulated over a run.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    event_counts: [u64; EventKind::COUNT],
    pub total_random_events: u64,
    /// Distinct particle indexes that saw at least one event.
    pub particles_with_events: u64,
    pub simulation_steps: u64,
    /// Sum of the population size after every step.
    pub total_particle_count: u64,
    had_random_event: Vec<bool>,
}

impl Statistics {
    pub fn new(particle_count: usize) -> Self {
        let mut stats = Self::default();
        stats.reset(particle_count);
        stats
    }

    /// Clears every counter before a new run of `particle_count` particles.
    pub fn reset(&mut self, particle_count: usize) {
        *self = Self {
            had_random_event: vec![false; particle_count],
            ..Self::default()
        };
    }

    pub fn event_count(&self, kind: EventKind) -> u64 {
        self.event_counts[kind.index()]
    }

    /// Counts one completed step and the population it left behind.
    pub fn record_step(&mut self, particle_count: usize) {
        self.simulation_steps += 1;
        self.total_particle_count += particle_count as u64;
    }

    pub fn average_particles_per_step(&self) -> Option<f64> {
        if self.simulation_steps == 0 {
            None
        } else {
            Some(self.total_particle_count as f64 / self.simulation_steps as f64)
        }
    }
}

impl EventSink for Statistics {
    /// Indexes are only tracked up to the population size at reset; later
    /// indexes (children, or survivors shifted by removals) are counted as events but
    /// cannot mark a particle as affected.
    fn record_event(&mut self, kind: EventKind, index: usize) {
        self.event_counts[kind.index()] += 1;
        self.total_random_events += 1;
        if let Some(seen) = self.had_random_event.get_mut(index) {
            if !*seen {
                *seen = true;
                self.particles_with_events += 1;
            }
        }
    }
}

/// One particle picked out by a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ranked {
    pub index: usize,
    pub value: f64,
    pub type_id: usize,
}

/// Aggregates for one particle type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub type_id: usize,
    pub count: usize,
    pub mean_mass: f64,
    pub mean_speed: f64,
    /// Mean distance between two particles of this type, if there are at least two.
    pub mean_pair_distance: Option<f64>,
}

/// Event counters as they appear in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTotals {
    pub removed: u64,
    pub reproductions: u64,
    pub type_changes: u64,
    pub teleports: u64,
    pub mass_changes: u64,
    pub speed_jumps: u64,
    pub sleeps: u64,
    pub total: u64,
    pub particles_with_events: u64,
}

impl EventTotals {
    fn from_stats(stats: &Statistics) -> Self {
        Self {
            removed: stats.event_count(EventKind::Removal),
            reproductions: stats.event_count(EventKind::Reproduction),
            type_changes: stats.event_count(EventKind::TypeChange),
            teleports: stats.event_count(EventKind::Teleport),
            mass_changes: stats.event_count(EventKind::MassChange),
            speed_jumps: stats.event_count(EventKind::SpeedJump),
            sleeps: stats.event_count(EventKind::Sleep),
            total: stats.total_random_events,
            particles_with_events: stats.particles_with_events,
        }
    }

    fn rows(&self) -> [(&'static str, u64); 9] {
        [
            ("removed particles", self.removed),
            ("reproductions", self.reproductions),
            ("type changes", self.type_changes),
            ("teleports", self.teleports),
            ("sleeping particles", self.sleeps),
            ("mass changes", self.mass_changes),
            ("speed jumps", self.speed_jumps),
            ("total random events", self.total),
            ("particles with events", self.particles_with_events),
        ]
    }
}

/// End-of-run report over the final population.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub particle_count: usize,
    pub per_type: Vec<TypeSummary>,
    pub mean_mass: f64,
    pub mean_speed: f64,
    pub mean_pair_distance: f64,
    pub bounding_box_density: f64,
    pub std_dev_x: f64,
    pub std_dev_y: f64,
    pub fastest: Vec<Ranked>,
    pub slowest: Vec<Ranked>,
    pub heaviest: Vec<Ranked>,
    pub close_pairs: usize,
    pub densest_cell: usize,
    pub simulation_steps: u64,
    pub average_particles_per_step: f64,
    pub events: EventTotals,
}

fn distance(a: &Particle, b: &Particle) -> f64 {
    let dx = f64::from(b.position.x - a.position.x);
    let dy = f64::from(b.position.y - a.position.y);
    (dx * dx + dy * dy).sqrt()
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

impl Summary {
    /// Builds the report, or `None` when there is no particle left to describe.
    pub fn compute(stats: &Statistics, particles: &[Particle]) -> Option<Self> {
        let count = particles.len();
        if count == 0 {
            return None;
        }

        // Per-type counts, masses and speeds
        let mut by_type: BTreeMap<usize, (usize, f64, f64)> = BTreeMap::new();
        for p in particles {
            let entry = by_type.entry(p.type_id).or_default();
            entry.0 += 1;
            entry.1 += f64::from(p.mass);
            entry.2 += f64::from(p.speed());
        }

        // Pairwise distances, close approaches
        let mut dist_sum = 0.0;
        let mut dist_count = 0usize;
        let mut close_pairs = 0usize;
        let mut same_type: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                let d = distance(a, b);
                dist_sum += d;
                dist_count += 1;
                if d < CLOSE_PAIR_DISTANCE {
                    close_pairs += 1;
                }
                if a.type_id == b.type_id {
                    let entry = same_type.entry(a.type_id).or_default();
                    entry.0 += d;
                    entry.1 += 1;
                }
            }
        }

        let per_type = by_type
            .iter()
            .map(|(&type_id, &(n, mass, speed))| TypeSummary {
                type_id,
                count: n,
                mean_mass: mean(mass, n),
                mean_speed: mean(speed, n),
                mean_pair_distance: same_type.get(&type_id).map(|&(sum, pairs)| mean(sum, pairs)),
            })
            .collect();

        let total_mass: f64 = particles.iter().map(|p| f64::from(p.mass)).sum();
        let total_speed: f64 = particles.iter().map(|p| f64::from(p.speed())).sum();

        // Spread and bounding box
        let xs: Vec<f64> = particles.iter().map(|p| f64::from(p.position.x)).collect();
        let ys: Vec<f64> = particles.iter().map(|p| f64::from(p.position.y)).collect();
        let std_dev = |v: &[f64]| {
            let m = mean(v.iter().sum(), v.len());
            mean(v.iter().map(|x| (x - m) * (x - m)).sum(), v.len()).sqrt()
        };
        let (min_x, max_x) = min_max(&xs);
        let (min_y, max_y) = min_max(&ys);
        let mut area = (max_x - min_x) * (max_y - min_y);
        if area < 0.01 {
            area = 1.0;
        }

        // Densest cell of a grid laid over the bounding box
        let mut cells = vec![0usize; DENSITY_GRID_SIZE * DENSITY_GRID_SIZE];
        for (&x, &y) in xs.iter().zip(&ys) {
            let cx = grid_cell(x, min_x, max_x);
            let cy = grid_cell(y, min_y, max_y);
            cells[cy * DENSITY_GRID_SIZE + cx] += 1;
        }
        let densest_cell = cells.iter().copied().max().unwrap_or(0);

        // Rankings
        let ranked = |value: &dyn Fn(&Particle) -> f64| {
            let mut all: Vec<Ranked> = particles
                .iter()
                .enumerate()
                .map(|(index, p)| Ranked { index, value: value(p), type_id: p.type_id })
                .collect();
            all.sort_by(|a, b| b.value.total_cmp(&a.value));
            all
        };
        let by_speed = ranked(&|p| f64::from(p.speed()));
        let fastest = by_speed.iter().take(TOP_N).copied().collect();
        let slowest = by_speed.iter().rev().take(TOP_N).copied().collect();
        let heaviest = ranked(&|p| f64::from(p.mass)).into_iter().take(TOP_N).collect();

        Some(Self {
            particle_count: count,
            per_type,
            mean_mass: mean(total_mass, count),
            mean_speed: mean(total_speed, count),
            mean_pair_distance: mean(dist_sum, dist_count),
            bounding_box_density: count as f64 / area,
            std_dev_x: std_dev(&xs),
            std_dev_y: std_dev(&ys),
            fastest,
            slowest,
            heaviest,
            close_pairs,
            densest_cell,
            simulation_steps: stats.simulation_steps,
            average_particles_per_step: stats.average_particles_per_step().unwrap_or(count as f64),
            events: EventTotals::from_stats(stats),
        })
    }

    /// Writes the per-type table followed by the event counters as CSV.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref)
            .with_context(|| format!("Failed to create statistics file '{}'", path_ref.display()))?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);

        writer.write_record(["type", "count", "mean_mass", "mean_speed"])?;
        for t in &self.per_type {
            writer.write_record(&[
                t.type_id.to_string(),
                t.count.to_string(),
                format!("{:.4}", t.mean_mass),
                format!("{:.4}", t.mean_speed),
            ])?;
        }

        writer.write_record(["event", "value"])?;
        for (label, value) in self.events.rows() {
            writer.write_record(&[label.to_string(), value.to_string()])?;
        }
        writer.write_record(&["simulation steps".to_string(), self.simulation_steps.to_string()])?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the whole summary as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref)
            .with_context(|| format!("Failed to create summary file '{}'", path_ref.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("Failed to write summary JSON to '{}'", path_ref.display()))?;
        Ok(())
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn grid_cell(v: f64, min: f64, max: f64) -> usize {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let cell = ((v - min) / span * DENSITY_GRID_SIZE as f64) as usize;
    cell.min(DENSITY_GRID_SIZE - 1)
}

fn type_label(type_id: usize) -> String {
    match type_id {
        0 => "0(R)".to_string(),
        1 => "1(G)".to_string(),
        2 => "2(B)".to_string(),
        other => other.to_string(),
    }
}

fn write_ranking(f: &mut fmt::Formatter<'_>, title: &str, what: &str, rows: &[Ranked]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    for r in rows {
        writeln!(f, "  index {} {}: {:.3} type: {}", r.index, what, r.value, type_label(r.type_id))?;
    }
    Ok(())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation summary ---")?;
        writeln!(f, "Particles by type:")?;
        for t in &self.per_type {
            writeln!(f, "  type {}: {}", type_label(t.type_id), t.count)?;
        }
        writeln!(f, "Mean mass by type:")?;
        for t in &self.per_type {
            writeln!(f, "  type {}: {:.3}", type_label(t.type_id), t.mean_mass)?;
        }
        writeln!(f, "Mean mass of all particles: {:.3}", self.mean_mass)?;
        for (label, value) in self.events.rows() {
            writeln!(f, "{}: {}", label, value)?;
        }
        writeln!(f, "Mean distance between all particles: {:.3}", self.mean_pair_distance)?;
        writeln!(f, "Mean distance between particles of one type:")?;
        for t in &self.per_type {
            if let Some(d) = t.mean_pair_distance {
                writeln!(f, "  type {}: {:.3}", type_label(t.type_id), d)?;
            }
        }
        writeln!(f, "Bounding box density: {:.3}", self.bounding_box_density)?;
        writeln!(f, "Std dev X: {:.3}, Y: {:.3}", self.std_dev_x, self.std_dev_y)?;
        writeln!(f, "Mean speed of all particles: {:.3}", self.mean_speed)?;
        writeln!(f, "Mean speed by type:")?;
        for t in &self.per_type {
            writeln!(f, "  type {}: {:.3}", type_label(t.type_id), t.mean_speed)?;
        }
        write_ranking(f, "Fastest particles", "speed", &self.fastest)?;
        write_ranking(f, "Slowest particles", "speed", &self.slowest)?;
        write_ranking(f, "Heaviest particles", "mass", &self.heaviest)?;
        writeln!(f, "Simulation steps: {}", self.simulation_steps)?;
        writeln!(f, "Average particles per step: {:.3}", self.average_particles_per_step)?;
        writeln!(f, "Close pairs (< {:.1}): {}", CLOSE_PAIR_DISTANCE, self.close_pairs)?;
        writeln!(
            f,
            "Densest cell of a {}x{} grid: {}",
            DENSITY_GRID_SIZE, DENSITY_GRID_SIZE, self.densest_cell
        )?;
        write!(f, "--- End of summary ---")
    }
}
