//! The two force laws and the bulk reset routines that go with them.
//!
//! Both laws evaluate every pair exhaustively and read the positions the population had
//! at the start of the tick, then write the new velocities and positions.

use crate::events::{inject_events, EventSink};
use crate::interaction::InteractionMatrix;
use crate::particle::{random_coord, random_mass, random_type, Particle, ParticleStore};
use log::debug;
use particle_common::{reflect_coord, toroidal_displacement, wrap_coord, SimParams, Vec2};
use rand::Rng;

/// Same-type attraction strength of the clustering law.
pub const GROUP_ATTRACT_STRENGTH: f32 = 0.1;
/// Cross-type repulsion strength of the clustering law; also scales the overlap push.
pub const GROUP_REPEL_STRENGTH: f32 = 0.02;
/// Lower clamp on the squared distance in the clustering law.
pub const MIN_DISTANCE: f32 = 1e-3;
/// Speed cap of the clustering law.
pub const MAX_SPEED: f32 = 0.5;
/// Radius used for the soft collision response of the clustering law.
pub const PARTICLE_RADIUS: f32 = 0.5;
/// Multiplier of the overlap depth in the soft collision response.
const OVERLAP_STIFFNESS: f32 = 10.0;

/// State of one particle as seen by the others during a tick.
#[derive(Debug, Clone, Copy)]
struct Source {
    position: Vec2,
    type_id: usize,
    mass: f32,
}

fn sources(store: &ParticleStore) -> Vec<Source> {
    store
        .iter()
        .map(|p| Source {
            position: p.position,
            type_id: p.type_id,
            mass: p.mass,
        })
        .collect()
}

/// Fills `store` with `count` particles for the interaction-matrix law.
///
/// Positions are uniform over `[0, width) x [0, height)`, types uniform, velocities zero
/// and masses drawn from `[MASS_MIN, MASS_MAX)`.
pub fn reset_particles<R: Rng + ?Sized>(
    store: &mut ParticleStore,
    count: usize,
    params: &SimParams,
    rng: &mut R,
) {
    store.clear(count);
    for id in 0..count {
        let position = Vec2::new(
            random_coord(rng, params.world_width),
            random_coord(rng, params.world_height),
        );
        let type_id = random_type(rng);
        let mass = random_mass(rng);
        store.push(Particle::new(id, position, type_id, mass));
    }
    debug!("Reset {} particles for the interaction-matrix law.", store.len());
}

/// Fills `store` with `count` unit-mass particles for the clustering law.
///
/// Positions are uniform over the reflective box `[0, width-1] x [0, height-1]`.
pub fn init_group<R: Rng + ?Sized>(
    store: &mut ParticleStore,
    count: usize,
    params: &SimParams,
    rng: &mut R,
) {
    store.clear(count);
    let max_x = params.max_x().max(0.0);
    let max_y = params.max_y().max(0.0);
    for id in 0..count {
        let position = Vec2::new(rng.random_range(0.0..=max_x), rng.random_range(0.0..=max_y));
        let type_id = random_type(rng);
        store.push(Particle::new(id, position, type_id, 1.0));
    }
    debug!("Reset {} particles for the clustering law.", store.len());
}

/// Acceleration a particle of `me` receives from every other source under the matrix law.
fn matrix_acceleration(
    index: usize,
    me: Source,
    all: &[Source],
    matrix: &InteractionMatrix,
    params: &SimParams,
) -> Vec2 {
    let mut acc = Vec2::zero();
    for (other_idx, other) in all.iter().enumerate() {
        if other_idx == index {
            continue;
        }
        let delta = toroidal_displacement(
            me.position,
            other.position,
            params.world_width,
            params.world_height,
        );
        let dist_sq = delta.length_squared() + params.softening;
        let dist = dist_sq.sqrt();
        let accel = matrix.coeff(me.type_id, other.type_id) * other.mass / dist_sq;
        acc = acc.add(delta.scale(accel / dist));
    }
    acc
}

/// Advances every particle one tick under the interaction-matrix law on the torus.
///
/// Accelerations are computed against the positions at the start of the tick, then each
/// particle gets `v += a * base_speed_factor`, `v *= 1 - friction`, `x += v` and is wrapped
/// back into the world.
pub fn integrate_matrix(store: &mut ParticleStore, matrix: &InteractionMatrix, params: &SimParams) {
    let snapshot = sources(store);
    let damping = 1.0 - params.friction;

    for (index, p) in store.iter_mut().enumerate() {
        let acc = matrix_acceleration(index, snapshot[index], &snapshot, matrix, params);

        p.velocity = p
            .velocity
            .add(acc.scale(params.base_speed_factor))
            .scale(damping);

        let moved = p.position.add(p.velocity);
        p.position = Vec2::new(
            wrap_coord(moved.x, params.world_width),
            wrap_coord(moved.y, params.world_height),
        );

        p.tick_highlight();
    }
}

/// One full interaction-matrix tick: the force pass, then (if enabled) the random events.
///
/// Event notifications go to `sink`; the matrix is only read.
pub fn simulate<R, S>(
    store: &mut ParticleStore,
    matrix: &InteractionMatrix,
    params: &SimParams,
    events_enabled: bool,
    rng: &mut R,
    sink: &mut S,
) where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    integrate_matrix(store, matrix, params);
    if events_enabled {
        inject_events(store, params, rng, sink);
    }
}

/// Force a particle receives from every other source under the clustering law.
fn group_force(index: usize, me: Source, all: &[Source]) -> Vec2 {
    let mut force = Vec2::zero();
    for (other_idx, other) in all.iter().enumerate() {
        if other_idx == index {
            continue;
        }
        let delta = other.position.sub(me.position);
        let dist_sq = delta.length_squared().max(MIN_DISTANCE);
        let dist = dist_sq.sqrt();
        let normal = delta.scale(1.0 / dist);
        let inv_dist_sq = 1.0 / dist_sq;

        if me.type_id == other.type_id {
            force = force.add(normal.scale(GROUP_ATTRACT_STRENGTH * inv_dist_sq));
        } else {
            force = force.sub(normal.scale(GROUP_REPEL_STRENGTH * inv_dist_sq));
        }

        // Soft push apart when the two discs overlap, whatever their types
        let contact = 2.0 * PARTICLE_RADIUS;
        if dist < contact {
            let overlap = contact - dist;
            force = force.sub(normal.scale(GROUP_REPEL_STRENGTH * overlap * OVERLAP_STIFFNESS));
        }
    }
    force
}

/// Advances every particle one tick under the clustering law in the reflective box.
///
/// Velocity takes the summed force without friction and is capped at [`MAX_SPEED`];
/// positions are clamped to `[0, bound-1]` with the velocity component negated on contact.
pub fn update_group(store: &mut ParticleStore, params: &SimParams) {
    let snapshot = sources(store);
    let max_x = params.max_x();
    let max_y = params.max_y();

    for (index, p) in store.iter_mut().enumerate() {
        let force = group_force(index, snapshot[index], &snapshot);
        p.velocity = p.velocity.add(force).clamp_length(MAX_SPEED);

        let moved = p.position.add(p.velocity);
        let (x, hit_x) = reflect_coord(moved.x, max_x);
        let (y, hit_y) = reflect_coord(moved.y, max_y);
        p.position = Vec2::new(x, y);
        if hit_x {
            p.velocity.x = -p.velocity.x;
        }
        if hit_y {
            p.velocity.y = -p.velocity.y;
        }

        p.tick_highlight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{interaction_matrix, Preset};
    use crate::particle::TYPE_COUNT;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle(id: usize, x: f32, y: f32, type_id: usize) -> Particle {
        Particle::new(id, Vec2::new(x, y), type_id, 1.0)
    }

    #[test]
    fn reset_places_particles_inside_the_torus() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = SimParams::for_world(40, 20);
        let mut store = ParticleStore::new();
        reset_particles(&mut store, 300, &params, &mut rng);
        assert_eq!(store.len(), 300);
        for (i, p) in store.iter().enumerate() {
            assert_eq!(p.id, i);
            assert!((0.0..40.0).contains(&p.position.x));
            assert!((0.0..20.0).contains(&p.position.y));
            assert!(p.type_id < TYPE_COUNT);
            assert!((1.0..1.5).contains(&p.mass));
            assert_eq!(p.velocity, Vec2::zero());
            assert_eq!(p.highlight_ticks, 0);
        }
    }

    #[test]
    fn init_group_uses_unit_mass_inside_the_box() {
        let mut rng = StdRng::seed_from_u64(12);
        let params = SimParams::for_world(10, 5);
        let mut store = ParticleStore::new();
        init_group(&mut store, 100, &params, &mut rng);
        for (i, p) in store.iter().enumerate() {
            assert_eq!(p.id, i);
            assert_eq!(p.mass, 1.0);
            assert!((0.0..=9.0).contains(&p.position.x));
            assert!((0.0..=4.0).contains(&p.position.y));
        }
    }

    #[test]
    fn attraction_pulls_across_the_seam() {
        // Type 0 is attracted by type 1 under the hunt preset; the short path runs
        // across x = 0, so the chaser must move left.
        let params = SimParams::for_world(100, 50);
        let matrix = Preset::Hunt.matrix();
        let mut store: ParticleStore =
            vec![particle(0, 1.0, 25.0, 0), particle(1, 98.0, 25.0, 1)].into_iter().collect();
        integrate_matrix(&mut store, &matrix, &params);

        let chaser = &store.as_slice()[0];
        assert!(chaser.velocity.x < 0.0);
        assert!(chaser.velocity.y.abs() < 1e-6);
        // the prey (coefficient -0.9 towards type 0) runs away, i.e. left as well
        let prey = &store.as_slice()[1];
        assert!(prey.velocity.x < 0.0);
    }

    #[test]
    fn matrix_step_matches_hand_computation() {
        let params = SimParams::for_world(100, 100);
        let matrix = InteractionMatrix::from_rows([[0.5, 0.0, 0.0], [0.0; 3], [0.0; 3]]);
        let mut a = particle(0, 10.0, 10.0, 0);
        let mut b = particle(1, 13.0, 14.0, 0);
        a.mass = 1.2;
        b.mass = 1.4;
        let mut store: ParticleStore = vec![a, b].into_iter().collect();
        integrate_matrix(&mut store, &matrix, &params);

        // distance 5, dist_sq 25.01
        let dist_sq = 25.0f32 + 0.01;
        let dist = dist_sq.sqrt();
        let accel = 0.5 * 1.4 / dist_sq;
        let vx = accel * 3.0 / dist * 0.1 * 0.9;
        let vy = accel * 4.0 / dist * 0.1 * 0.9;
        let p = &store.as_slice()[0];
        assert!((p.velocity.x - vx).abs() < 1e-7);
        assert!((p.velocity.y - vy).abs() < 1e-7);
        assert!((p.position.x - (10.0 + vx)).abs() < 1e-5);
        assert!((p.position.y - (10.0 + vy)).abs() < 1e-5);
    }

    #[test]
    fn forces_use_positions_from_the_start_of_the_tick() {
        let params = SimParams::for_world(100, 100);
        let matrix = InteractionMatrix::from_rows([[1.0; 3]; 3]);
        let mut store: ParticleStore =
            vec![particle(0, 40.0, 50.0, 0), particle(1, 60.0, 50.0, 0)].into_iter().collect();
        integrate_matrix(&mut store, &matrix, &params);
        let [a, b] = [&store.as_slice()[0], &store.as_slice()[1]];
        // symmetric pair, simultaneous update: mirror-image velocities
        assert!((a.velocity.x + b.velocity.x).abs() < 1e-7);
        assert!(a.velocity.x > 0.0);
    }

    #[test]
    fn zero_matrix_leaves_particles_at_rest() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = SimParams::for_world(60, 30);
        let mut store = ParticleStore::new();
        reset_particles(&mut store, 10, &params, &mut rng);
        let before: Vec<Vec2> = store.iter().map(|p| p.position).collect();
        let matrix = interaction_matrix(0);
        for _ in 0..100 {
            integrate_matrix(&mut store, &matrix, &params);
        }
        for (p, start) in store.iter().zip(before) {
            assert_eq!(p.velocity, Vec2::zero());
            assert_eq!(p.position, start);
        }
    }

    #[test]
    fn coincident_particles_stay_finite() {
        let params = SimParams::for_world(20, 20);
        let matrix = Preset::Chaos.matrix();
        let mut store: ParticleStore =
            vec![particle(0, 5.0, 5.0, 0), particle(1, 5.0, 5.0, 1)].into_iter().collect();
        integrate_matrix(&mut store, &matrix, &params);
        let mut group: ParticleStore =
            vec![particle(0, 5.0, 5.0, 0), particle(1, 5.0, 5.0, 0)].into_iter().collect();
        update_group(&mut group, &params);
        for p in store.iter().chain(group.iter()) {
            assert!(p.velocity.x.is_finite() && p.velocity.y.is_finite());
            assert!(p.position.x.is_finite() && p.position.y.is_finite());
        }
    }

    #[test]
    fn empty_store_is_a_no_op() {
        let params = SimParams::for_world(20, 20);
        let mut store = ParticleStore::new();
        integrate_matrix(&mut store, &Preset::Hunt.matrix(), &params);
        update_group(&mut store, &params);
        assert!(store.is_empty());
    }

    #[test]
    fn lone_particle_reflects_off_the_right_wall() {
        let params = SimParams::for_world(30, 10);
        let mut p = particle(0, 29.0, 5.0, 2);
        p.velocity = Vec2::new(0.3, 0.0);
        let mut store: ParticleStore = vec![p].into_iter().collect();
        update_group(&mut store, &params);
        let p = &store.as_slice()[0];
        assert_eq!(p.position.x, 29.0);
        assert!(p.velocity.x < 0.0);
        assert!((p.velocity.x + 0.3).abs() < 1e-6);
    }

    #[test]
    fn same_types_attract_and_different_types_repel() {
        let params = SimParams::for_world(100, 100);
        let mut same: ParticleStore =
            vec![particle(0, 40.0, 50.0, 1), particle(1, 45.0, 50.0, 1)].into_iter().collect();
        update_group(&mut same, &params);
        assert!(same.as_slice()[0].velocity.x > 0.0);

        let mut mixed: ParticleStore =
            vec![particle(0, 40.0, 50.0, 0), particle(1, 45.0, 50.0, 2)].into_iter().collect();
        update_group(&mut mixed, &params);
        assert!(mixed.as_slice()[0].velocity.x < 0.0);
    }

    #[test]
    fn overlap_pushes_apart_even_same_types() {
        // 0.1 inside contact range: the pull is reduced by 0.02 * 0.1 * 10
        let force_at = |gap: f32| {
            let all = [
                Source { position: Vec2::new(0.0, 0.0), type_id: 0, mass: 1.0 },
                Source { position: Vec2::new(gap, 0.0), type_id: 0, mass: 1.0 },
            ];
            group_force(0, all[0], &all)
        };
        let inside = force_at(0.9);
        let pull_only = GROUP_ATTRACT_STRENGTH / (0.9 * 0.9);
        let push = GROUP_REPEL_STRENGTH * 0.1 * 10.0;
        assert!((inside.x - (pull_only - push)).abs() < 1e-5);
    }

    #[test]
    fn clustering_speed_is_capped() {
        let mut rng = StdRng::seed_from_u64(21);
        let params = SimParams::for_world(30, 15);
        let mut store = ParticleStore::new();
        init_group(&mut store, 80, &params, &mut rng);
        for _ in 0..50 {
            update_group(&mut store, &params);
            for p in store.iter() {
                assert!(p.speed() <= MAX_SPEED + 1e-5);
                assert!((0.0..=29.0).contains(&p.position.x));
                assert!((0.0..=14.0).contains(&p.position.y));
            }
        }
    }

    #[test]
    fn highlight_decrements_in_both_laws() {
        let params = SimParams::for_world(30, 30);
        let mut p = particle(0, 10.0, 10.0, 0);
        p.highlight_ticks = 2;
        let mut store: ParticleStore = vec![p.clone()].into_iter().collect();
        integrate_matrix(&mut store, &InteractionMatrix::zero(), &params);
        assert_eq!(store.as_slice()[0].highlight_ticks, 1);

        let mut group: ParticleStore = vec![p].into_iter().collect();
        update_group(&mut group, &params);
        update_group(&mut group, &params);
        update_group(&mut group, &params);
        assert_eq!(group.as_slice()[0].highlight_ticks, 0);
    }
}
