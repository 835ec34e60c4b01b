use super::{to_lattice, to_world, BoundingBox, CellId, Lattice, LatticeIdx, LatticeLoad};

use ahash::AHashMap;
use nalgebra::Point3;

// keep boundary-derived reservations from allocating absurd tables
const RESERVE_CAP: usize = 4 * 1024 * 1024;

/// Hash-table backend keyed by quantized lattice coordinates.
///
/// Unbounded: every representable coordinate is addressable, so "outside
/// current bounds" never rejects an insert here. Distinct coordinates are
/// distinct keys; there is no epsilon comparison to collide them.
#[derive(Default)]
pub struct HashLattice {
    map: AHashMap<LatticeIdx, CellId>,
    positions: Vec<Point3<f32>>,
    locked: bool,
    bb: BoundingBox,
}

impl Lattice for HashLattice {
    fn reserve_bounds(&mut self, min: LatticeIdx, max: LatticeIdx) {
        if self.locked {
            return;
        }

        let volume = (0..3)
            .map(|axis| (max.idx[axis] - min.idx[axis] + 1).max(1) as usize)
            .product::<usize>();
        // growth fills a fraction of the box; reserve for a dense-ish run
        self.map.reserve(volume.min(RESERVE_CAP));
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn insert(&mut self, pos: &Point3<f32>, id: CellId) -> bool {
        let coord = to_lattice(pos);
        if self.map.contains_key(&coord) {
            return false;
        }

        self.map.insert(coord, id);
        self.bb.add(coord);

        if id >= self.positions.len() {
            self.positions.resize(id + 1, super::unknown_position());
        }
        self.positions[id] = to_world(coord);
        true
    }

    fn is_occupied(&self, pos: &Point3<f32>) -> bool {
        self.map.contains_key(&to_lattice(pos))
    }

    fn find_id(&self, pos: &Point3<f32>) -> Option<CellId> {
        self.map.get(&to_lattice(pos)).copied()
    }

    fn position_for_id(&self, id: CellId) -> Point3<f32> {
        self.positions
            .get(id)
            .copied()
            .unwrap_or_else(super::unknown_position)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn bounding_box(&self) -> &BoundingBox {
        &self.bb
    }

    fn load(&self) -> LatticeLoad {
        LatticeLoad {
            slots: self.map.capacity().max(1),
            occupied: self.map.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor_positions;

    #[test]
    fn test_insert_is_idempotent() {
        let mut lattice = HashLattice::default();
        let pos = to_world(LatticeIdx::new([7, -7, 7]));

        assert!(lattice.insert(&pos, 0));
        assert!(!lattice.insert(&pos, 1));
        assert_eq!(lattice.len(), 1);
        assert_eq!(lattice.find_id(&pos), Some(0));
    }

    #[test]
    fn test_nearby_positions_share_a_slot() {
        let mut lattice = HashLattice::default();
        let center = to_world(LatticeIdx::new([0, 0, 0]));
        let jittered = Point3::new(center.x + 0.4, center.y - 0.4, center.z + 0.4);

        assert!(lattice.insert(&center, 0));
        assert!(!lattice.insert(&jittered, 1));
        assert_eq!(lattice.find_id(&jittered), Some(0));
    }

    #[test]
    fn test_available_neighbors_shrink_as_filled() {
        let mut lattice = HashLattice::default();
        let center = to_world(LatticeIdx::new([0, 0, 0]));
        lattice.insert(&center, 0);

        assert_eq!(lattice.available_neighbors(&center).len(), 14);

        for (i, npos) in neighbor_positions(&center).iter().enumerate() {
            lattice.insert(npos, i + 1);
        }
        assert!(lattice.available_neighbors(&center).is_empty());
        assert_eq!(lattice.occupied_neighbors(&center).len(), 14);
    }

    #[test]
    fn test_position_for_id_reverse_map() {
        let mut lattice = HashLattice::default();
        let pos = to_world(LatticeIdx::new([3, 1, -2]));
        lattice.insert(&pos, 0);

        assert_eq!(lattice.position_for_id(0), pos);
        assert_eq!(lattice.position_for_id(9), super::super::unknown_position());
    }
}
