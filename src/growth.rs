use super::{face_of, neighbor_positions, Boundary, Face, Lattice, NEIGHBOR_COUNT};

use nalgebra::Point3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Duration;

/// Default per-second spawn chance of an existing cell.
pub const SPAWN_CHANCE: f32 = 0.8;

/// A not-yet-committed growth event: the chosen free neighbor slot and
/// which face of the parent it grows across.
#[derive(Clone, Copy, Debug)]
pub struct Proposal {
    pub pos: Point3<f32>,
    pub face: Face,
}

#[derive(Clone, Copy, Debug)]
pub struct GrowthConfig {
    /// Spawn probability per cell per second; scaled by the tick interval.
    pub spawn_chance: f32,
    /// Base seed for the per-candidate random streams.
    pub seed: u64,
    /// Background loop yield interval.
    pub tick_interval: Duration,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            spawn_chance: SPAWN_CHANCE,
            seed: 0x0C70_C011_5EED,
            tick_interval: Duration::from_millis(10),
        }
    }
}

impl GrowthConfig {
    /// Per-tick Bernoulli probability.
    pub fn intensity(&self) -> f32 {
        self.spawn_chance * self.tick_interval.as_secs_f32()
    }
}

// splitmix64 finalizer over (seed, tick, id): independent stream per
// candidate, no shared generator between rayon workers
fn stream_seed(seed: u64, tick: u64, id: u64) -> u64 {
    let mut z = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ id.wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One growth tick over every existing cell.
///
/// Each cell independently becomes a candidate with probability
/// `intensity`; a candidate proposes at most one new cell, chosen uniformly
/// among its unoccupied, in-boundary neighbor slots. Evaluation is
/// read-only against the index and parallel across candidates; committing
/// the returned proposals is the caller's serialized step, where duplicate
/// proposals for the same slot resolve first-writer-wins.
pub fn step<L: Lattice>(
    lattice: &L,
    boundary: &Boundary,
    intensity: f32,
    seed: u64,
    tick: u64,
) -> Vec<Proposal> {
    if intensity <= 0.0 {
        return Vec::new();
    }

    (0..lattice.len())
        .into_par_iter()
        .filter_map(|id| {
            let mut rng = SmallRng::seed_from_u64(stream_seed(seed, tick, id as u64));
            if rng.gen::<f32>() >= intensity {
                return None;
            }

            let pos = lattice.position_for_id(id);
            let mut open: Vec<Proposal> = Vec::with_capacity(NEIGHBOR_COUNT);
            for (i, npos) in neighbor_positions(&pos).into_iter().enumerate() {
                if !lattice.is_occupied(&npos) && boundary.contains(&npos) {
                    open.push(Proposal {
                        pos: npos,
                        face: face_of(i),
                    });
                }
            }

            if open.is_empty() {
                None
            } else {
                Some(open[rng.gen_range(0..open.len())])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{to_world, HashLattice, LatticeIdx};

    fn seeded() -> (HashLattice, Boundary) {
        let mut lattice = HashLattice::default();
        lattice.insert(&to_world(LatticeIdx::new([0, 0, 0])), 0);
        (lattice, Boundary::default())
    }

    #[test]
    fn test_zero_intensity_proposes_nothing() {
        let (lattice, boundary) = seeded();
        assert!(step(&lattice, &boundary, 0.0, 1, 0).is_empty());
    }

    #[test]
    fn test_full_intensity_single_proposal_per_candidate() {
        let (lattice, boundary) = seeded();
        let proposals = step(&lattice, &boundary, 1.0, 1, 0);
        // one cell, one candidacy, one proposal
        assert_eq!(proposals.len(), 1);
        let p = proposals[0];
        assert!(!lattice.is_occupied(&p.pos));
        assert!(boundary.contains(&p.pos));
    }

    #[test]
    fn test_same_seed_same_proposals() {
        let (lattice, boundary) = seeded();
        let a = step(&lattice, &boundary, 1.0, 42, 7);
        let b = step(&lattice, &boundary, 1.0, 42, 7);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.face, y.face);
        }
    }

    #[test]
    fn test_boundary_filters_proposals() {
        let mut lattice = HashLattice::default();
        let origin = to_world(LatticeIdx::new([0, 0, 0]));
        lattice.insert(&origin, 0);

        // boundary so tight only the seed slot is inside
        let boundary = Boundary::new(
            crate::BoundaryShape::Cylinder {
                radius: 1.0,
                height: 1.0,
            },
            origin,
        );
        assert!(step(&lattice, &boundary, 1.0, 1, 0).is_empty());
    }
}
