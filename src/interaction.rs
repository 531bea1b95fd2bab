//! Interaction presets and the per-type-pair coefficient tables they select.

use crate::forces::{GROUP_ATTRACT_STRENGTH, GROUP_REPEL_STRENGTH};
use crate::particle::TYPE_COUNT;
use serde::Serialize;
use std::fmt;

pub type Coefficients = [[f32; TYPE_COUNT]; TYPE_COUNT];

/// `coeff[a][b]` is the force multiplier applied to a type-`a` particle by a type-`b` one.
///
/// Neither symmetric nor zero on the diagonal in general.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionMatrix {
    coeff: Coefficients,
}

impl InteractionMatrix {
    pub const fn from_rows(coeff: Coefficients) -> Self {
        Self { coeff }
    }

    /// The force-free matrix.
    pub const fn zero() -> Self {
        Self { coeff: [[0.0; TYPE_COUNT]; TYPE_COUNT] }
    }

    #[inline(always)]
    pub fn coeff(&self, a: usize, b: usize) -> f32 {
        self.coeff[a][b]
    }

    pub fn rows(&self) -> &Coefficients {
        &self.coeff
    }

    pub fn is_zero(&self) -> bool {
        self.coeff.iter().flatten().all(|&c| c == 0.0)
    }
}

impl Default for InteractionMatrix {
    fn default() -> Self {
        Self::zero()
    }
}

const HUNT: Coefficients = [
    [0.0, 0.9, -0.5],
    [-0.9, 0.0, 0.9],
    [0.5, -0.9, 0.0],
];

const STRATIFICATION: Coefficients = [
    [1.0, -0.5, -0.5],
    [-0.5, 1.0, -0.5],
    [-0.5, -0.5, 1.0],
];

const CHAOS: Coefficients = [
    [0.8, -0.6, 0.4],
    [0.2, 0.8, -0.7],
    [-0.5, 0.9, 0.5],
];

const ALLIANCES: Coefficients = [
    [1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

// Same-type attraction, cross-type repulsion, in the clustering law's own strengths.
// Lookup only: `ForceLaw::Clustering` computes its forces without reading a table.
const CLUSTERING: Coefficients = [
    [GROUP_ATTRACT_STRENGTH, -GROUP_REPEL_STRENGTH, -GROUP_REPEL_STRENGTH],
    [-GROUP_REPEL_STRENGTH, GROUP_ATTRACT_STRENGTH, -GROUP_REPEL_STRENGTH],
    [-GROUP_REPEL_STRENGTH, -GROUP_REPEL_STRENGTH, GROUP_ATTRACT_STRENGTH],
];

/// Named behaviour patterns a run can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Preset {
    /// Asymmetric chase: each type hunts the next and flees the previous.
    Hunt = 1,
    /// Every type clumps with itself and avoids the others.
    Stratification = 2,
    /// Hand-picked irregular coefficients.
    Chaos = 3,
    /// Types 0 and 1 band together against type 2.
    Alliances = 4,
    /// Dense same-type clusters in a walled box, driven by the clustering law.
    Clustering = 5,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Hunt,
        Preset::Stratification,
        Preset::Chaos,
        Preset::Alliances,
        Preset::Clustering,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Hunt => "hunt",
            Preset::Stratification => "stratification",
            Preset::Chaos => "chaos",
            Preset::Alliances => "alliances",
            Preset::Clustering => "clustering",
        }
    }

    /// True for the preset that runs the reflective clustering law instead of the matrix law.
    pub fn uses_clustering_law(self) -> bool {
        matches!(self, Preset::Clustering)
    }

    pub fn matrix(self) -> InteractionMatrix {
        InteractionMatrix::from_rows(match self {
            Preset::Hunt => HUNT,
            Preset::Stratification => STRATIFICATION,
            Preset::Chaos => CHAOS,
            Preset::Alliances => ALLIANCES,
            Preset::Clustering => CLUSTERING,
        })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.name())
    }
}

/// Looks up the coefficient table of a preset id.
///
/// Pure: the same id always yields the same table. Unknown ids yield the zero matrix,
/// which turns all pairwise forces off.
pub fn interaction_matrix(preset_id: u32) -> InteractionMatrix {
    Preset::from_id(preset_id)
        .map(Preset::matrix)
        .unwrap_or_else(InteractionMatrix::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_pure() {
        for id in 0..8 {
            let a = interaction_matrix(id);
            let b = interaction_matrix(id);
            for (ra, rb) in a.rows().iter().zip(b.rows()) {
                for (x, y) in ra.iter().zip(rb) {
                    assert_eq!(x.to_bits(), y.to_bits());
                }
            }
        }
    }

    #[test]
    fn unknown_ids_yield_zero_matrix() {
        for id in [0, 6, 42, u32::MAX] {
            assert!(interaction_matrix(id).is_zero(), "id {id}");
        }
        assert!(!interaction_matrix(1).is_zero());
    }

    #[test]
    fn hunt_is_asymmetric() {
        let m = interaction_matrix(Preset::Hunt.id());
        assert_eq!(m.coeff(0, 1), 0.9);
        assert_eq!(m.coeff(1, 0), -0.9);
        assert_eq!(m.coeff(2, 2), 0.0);
    }

    #[test]
    fn alliances_pit_two_types_against_the_third() {
        let m = Preset::Alliances.matrix();
        assert_eq!(m.coeff(0, 1), 1.0);
        assert_eq!(m.coeff(1, 0), 1.0);
        assert_eq!(m.coeff(0, 2), -1.0);
        assert_eq!(m.coeff(2, 1), -1.0);
    }

    #[test]
    fn clustering_table_mirrors_group_strengths() {
        let m = Preset::Clustering.matrix();
        for a in 0..TYPE_COUNT {
            for b in 0..TYPE_COUNT {
                let expected = if a == b { GROUP_ATTRACT_STRENGTH } else { -GROUP_REPEL_STRENGTH };
                assert_eq!(m.coeff(a, b), expected);
            }
        }
    }

    #[test]
    fn preset_ids_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_id(preset.id()), Some(preset));
        }
        assert_eq!(Preset::from_id(0), None);
        assert!(Preset::Clustering.uses_clustering_law());
        assert!(!Preset::Chaos.uses_clustering_law());
    }
}
