//! Random population mutations applied after the force pass of an interaction-matrix tick.

use crate::particle::{random_coord, random_mass, random_type, Particle, ParticleStore};
use log::trace;
use particle_common::{wrap_coord, SimParams, Vec2};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Largest jitter, per axis, between a parent and its reproduced child.
pub const REPRODUCTION_JITTER: f32 = 1.0;
/// Largest velocity component drawn by a speed jump.
pub const SPEED_JUMP_MAX: f32 = 2.0;

/// The seven mutations a particle can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Removal,
    TypeChange,
    Reproduction,
    Teleport,
    MassChange,
    SpeedJump,
    Sleep,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Removal,
        EventKind::TypeChange,
        EventKind::Reproduction,
        EventKind::Teleport,
        EventKind::MassChange,
        EventKind::SpeedJump,
        EventKind::Sleep,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Removal => "removal",
            EventKind::TypeChange => "type change",
            EventKind::Reproduction => "reproduction",
            EventKind::Teleport => "teleport",
            EventKind::MassChange => "mass change",
            EventKind::SpeedJump => "speed jump",
            EventKind::Sleep => "sleep",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives one notification per triggered event: its kind and the acting particle's
/// index at the time it fired.
pub trait EventSink {
    fn record_event(&mut self, kind: EventKind, index: usize);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record_event(&mut self, _kind: EventKind, _index: usize) {}
}

impl EventSink for Vec<(EventKind, usize)> {
    fn record_event(&mut self, kind: EventKind, index: usize) {
        self.push((kind, index));
    }
}

/// What applying an event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The particle is gone; the next survivor now sits at the same index.
    Removed,
    /// A child was appended at `child_index`.
    Reproduced { child_index: usize },
    /// The particle was changed in place.
    Mutated,
    /// No particle at that index.
    Missing,
}

/// Rolls the per-particle dice: `chance` to fire, then a uniform kind.
pub fn roll_event<R: Rng + ?Sized>(chance: f32, rng: &mut R) -> Option<EventKind> {
    if rng.random::<f32>() < chance {
        EventKind::from_index(rng.random_range(0..EventKind::COUNT))
    } else {
        None
    }
}

/// Applies `kind` to the particle at `index`.
///
/// Every kind except removal opens the highlight window; reproduction opens it on both
/// parent and child.
pub fn apply_event<R: Rng + ?Sized>(
    store: &mut ParticleStore,
    index: usize,
    kind: EventKind,
    params: &SimParams,
    rng: &mut R,
) -> EventOutcome {
    match kind {
        EventKind::Removal => match store.remove(index) {
            Some(_) => EventOutcome::Removed,
            None => EventOutcome::Missing,
        },
        EventKind::Reproduction => reproduce(store, index, params, rng),
        _ => match store.get_mut(index) {
            Some(p) => {
                p.highlight_ticks = params.highlight_ticks;
                mutate(p, kind, params, rng);
                EventOutcome::Mutated
            }
            None => EventOutcome::Missing,
        },
    }
}

/// Clones the particle at `index` next to itself and appends the clone.
fn reproduce<R: Rng + ?Sized>(
    store: &mut ParticleStore,
    index: usize,
    params: &SimParams,
    rng: &mut R,
) -> EventOutcome {
    let child_id = store.len();
    let Some(parent) = store.get_mut(index) else {
        return EventOutcome::Missing;
    };
    parent.highlight_ticks = params.highlight_ticks;

    let mut child = parent.clone();
    let jitter = Vec2::new(
        rng.random_range(-REPRODUCTION_JITTER..REPRODUCTION_JITTER),
        rng.random_range(-REPRODUCTION_JITTER..REPRODUCTION_JITTER),
    );
    let shifted = child.position.add(jitter);
    child.position = Vec2::new(
        wrap_coord(shifted.x, params.world_width),
        wrap_coord(shifted.y, params.world_height),
    );
    child.velocity = Vec2::zero();
    child.mass = random_mass(rng);
    child.id = child_id;
    store.push(child);

    EventOutcome::Reproduced { child_index: child_id }
}

fn mutate<R: Rng + ?Sized>(p: &mut Particle, kind: EventKind, params: &SimParams, rng: &mut R) {
    match kind {
        EventKind::TypeChange => {
            p.type_id = random_type(rng);
        }
        EventKind::Teleport => {
            p.position = Vec2::new(
                random_coord(rng, params.world_width),
                random_coord(rng, params.world_height),
            );
        }
        EventKind::MassChange => {
            p.mass = random_mass(rng);
        }
        EventKind::SpeedJump => {
            p.velocity = Vec2::new(
                rng.random_range(-SPEED_JUMP_MAX..SPEED_JUMP_MAX),
                rng.random_range(-SPEED_JUMP_MAX..SPEED_JUMP_MAX),
            );
        }
        EventKind::Sleep => {
            p.velocity = Vec2::zero();
        }
        // these change the store itself, see apply_event
        EventKind::Removal | EventKind::Reproduction => {}
    }
}

/// Gives every particle one roll at a random event, using `params.event_chance`.
pub fn inject_events<R, S>(store: &mut ParticleStore, params: &SimParams, rng: &mut R, sink: &mut S)
where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    let chance = params.event_chance;
    inject_events_with(store, params, rng, sink, |rng| roll_event(chance, rng));
}

/// Walks the store by index and lets `roll` decide the event, if any, for each particle.
///
/// After a removal the same index is visited again, since it now holds the next
/// survivor. The length is re-read on every iteration, so children appended during the
/// pass get their own roll.
pub fn inject_events_with<R, S, F>(
    store: &mut ParticleStore,
    params: &SimParams,
    rng: &mut R,
    sink: &mut S,
    mut roll: F,
) where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
    F: FnMut(&mut R) -> Option<EventKind>,
{
    let mut index = 0;
    while index < store.len() {
        if let Some(kind) = roll(rng) {
            sink.record_event(kind, index);
            let outcome = apply_event(store, index, kind, params, rng);
            trace!("Tick {}: {} at index {} -> {:?}", params.time_step, kind, index, outcome);
            if outcome == EventOutcome::Removed {
                continue;
            }
        }
        index += 1;
    }
}
