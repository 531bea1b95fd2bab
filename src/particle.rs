use particle_common::Vec2;
use rand::Rng;

/// Number of particle types, i.e. the size of every interaction matrix.
pub const TYPE_COUNT: usize = 3;

/// Bounds of the mass distribution used at creation and by mass-changing events.
pub const MASS_MIN: f32 = 1.0;
pub const MASS_MAX: f32 = 1.5;

/// One typed point particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Row/column of the interaction matrix, always below [`TYPE_COUNT`].
    pub type_id: usize,
    pub mass: f32,
    /// Ticks left in the "recently mutated" window, read only by renderers.
    pub highlight_ticks: u32,
    /// Insertion index at creation time. Not renumbered on removal, so it stops
    /// being unique once the population changes.
    pub id: usize,
}

impl Particle {
    pub fn new(id: usize, position: Vec2, type_id: usize, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::zero(),
            type_id,
            mass,
            highlight_ticks: 0,
            id,
        }
    }

    #[inline]
    pub fn is_highlighted(&self) -> bool {
        self.highlight_ticks > 0
    }

    /// Counts the highlight window down by one tick, stopping at zero.
    #[inline]
    pub fn tick_highlight(&mut self) {
        self.highlight_ticks = self.highlight_ticks.saturating_sub(1);
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Draws a mass from the creation distribution.
pub fn random_mass<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(MASS_MIN..MASS_MAX)
}

/// Draws a coordinate uniformly from `[0, extent)`; a collapsed axis yields 0.
pub fn random_coord<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.random_range(0.0..extent)
    } else {
        0.0
    }
}

/// Draws a particle type uniformly.
pub fn random_type<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.random_range(0..TYPE_COUNT)
}

/// Ordered, variable-length particle population.
///
/// Only the force laws and the event injector mutate it during a tick; everything else
/// reads it between ticks.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    /// Appends a particle at the end of the store.
    pub fn push(&mut self, particle: Particle) {
        if self.particles.len() == self.particles.capacity() {
            log::debug!(
                "Particle store growing past capacity {} (particles: {}).",
                self.particles.capacity(),
                self.particles.len()
            );
        }
        self.particles.push(particle);
    }

    /// Removes the particle at `index`, shifting every later particle down by one.
    pub fn remove(&mut self, index: usize) -> Option<Particle> {
        if index < self.particles.len() {
            Some(self.particles.remove(index))
        } else {
            None
        }
    }

    /// Drops every particle and reserves room for `capacity` new ones.
    pub fn clear(&mut self, capacity: usize) {
        self.particles.clear();
        self.particles.reserve(capacity);
    }
}

impl FromIterator<Particle> for ParticleStore {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        Self {
            particles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParticleStore {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
