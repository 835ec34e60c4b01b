use super::{to_lattice, to_world, BoundingBox, CellId, Lattice, LatticeIdx, LatticeLoad};

use nalgebra::Point3;

const NIL: CellId = CellId::MAX;

// default extent before the boundary sizes the index; xy in cells, z in
// layers (two layers per square-face step)
const DEFAULT_XY: i32 = 32;
const DEFAULT_Z: i32 = 64;

/// Flat-array backend: one slot per lattice coordinate inside a sized box.
///
/// Coordinates outside the box are "slot unavailable": occupancy checks
/// report false and inserts are no-ops. The box is resizable until
/// [`Lattice::lock`]; the manager sizes it once from the boundary volume
/// with a safety margin before growth starts.
pub struct DenseLattice {
    slots: Vec<CellId>,
    min: [i32; 3],
    dims: [usize; 3],

    positions: Vec<Point3<f32>>,
    occupied: usize,
    locked: bool,
    bb: BoundingBox,
}

impl Default for DenseLattice {
    fn default() -> Self {
        let mut out = Self {
            slots: Vec::new(),
            min: [0; 3],
            dims: [0; 3],
            positions: Vec::new(),
            occupied: 0,
            locked: false,
            bb: BoundingBox::default(),
        };
        out.reserve_bounds(
            LatticeIdx::new([-DEFAULT_XY, -DEFAULT_XY, -DEFAULT_Z]),
            LatticeIdx::new([DEFAULT_XY, DEFAULT_XY, DEFAULT_Z]),
        );
        out
    }
}

impl DenseLattice {
    fn slot_index(&self, coord: LatticeIdx) -> Option<usize> {
        let mut rel = [0usize; 3];
        for axis in 0..3 {
            let v = coord.idx[axis] - self.min[axis];
            if v < 0 || v as usize >= self.dims[axis] {
                return None;
            }
            rel[axis] = v as usize;
        }
        Some((rel[2] * self.dims[1] + rel[1]) * self.dims[0] + rel[0])
    }

    fn coord_of(min: [i32; 3], dims: [usize; 3], index: usize) -> LatticeIdx {
        let x = index % dims[0];
        let y = (index / dims[0]) % dims[1];
        let z = index / (dims[0] * dims[1]);
        LatticeIdx::new([
            min[0] + x as i32,
            min[1] + y as i32,
            min[2] + z as i32,
        ])
    }
}

impl Lattice for DenseLattice {
    fn reserve_bounds(&mut self, min: LatticeIdx, max: LatticeIdx) {
        if self.locked {
            // resizing a running simulation would invalidate in-flight
            // coordinate mappings
            return;
        }

        // never evict: widen the request to cover whatever is stored, so
        // the slot count here always matches the cell store
        let (min, max) = if self.occupied > 0 {
            (min.bb_min(&self.bb.min()), max.bb_max(&self.bb.max()))
        } else {
            (min, max)
        };

        let old = std::mem::take(&mut self.slots);
        let old_min = self.min;
        let old_dims = self.dims;

        self.min = min.idx;
        self.dims = [
            (max.idx[0] - min.idx[0] + 1).max(1) as usize,
            (max.idx[1] - min.idx[1] + 1).max(1) as usize,
            (max.idx[2] - min.idx[2] + 1).max(1) as usize,
        ];
        self.slots = vec![NIL; self.dims[0] * self.dims[1] * self.dims[2]];

        self.occupied = 0;
        for (i, &id) in old.iter().enumerate() {
            if id == NIL {
                continue;
            }
            let coord = Self::coord_of(old_min, old_dims, i);
            if let Some(slot) = self.slot_index(coord) {
                self.slots[slot] = id;
                self.occupied += 1;
            }
        }
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn insert(&mut self, pos: &Point3<f32>, id: CellId) -> bool {
        let coord = to_lattice(pos);
        let slot = match self.slot_index(coord) {
            Some(slot) => slot,
            None => return false,
        };
        if self.slots[slot] != NIL {
            return false;
        }

        self.slots[slot] = id;
        self.occupied += 1;
        self.bb.add(coord);

        if id >= self.positions.len() {
            self.positions.resize(id + 1, super::unknown_position());
        }
        self.positions[id] = to_world(coord);
        true
    }

    fn is_occupied(&self, pos: &Point3<f32>) -> bool {
        self.find_id(pos).is_some()
    }

    fn find_id(&self, pos: &Point3<f32>) -> Option<CellId> {
        let slot = self.slot_index(to_lattice(pos))?;
        match self.slots[slot] {
            NIL => None,
            id => Some(id),
        }
    }

    fn position_for_id(&self, id: CellId) -> Point3<f32> {
        self.positions
            .get(id)
            .copied()
            .unwrap_or_else(super::unknown_position)
    }

    fn len(&self) -> usize {
        self.occupied
    }

    fn bounding_box(&self) -> &BoundingBox {
        &self.bb
    }

    fn load(&self) -> LatticeLoad {
        LatticeLoad {
            slots: self.slots.len(),
            occupied: self.occupied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut lattice = DenseLattice::default();
        let pos = to_world(LatticeIdx::new([1, 2, 3]));

        assert!(lattice.insert(&pos, 0));
        assert!(!lattice.insert(&pos, 1));
        assert_eq!(lattice.len(), 1);
        assert_eq!(lattice.find_id(&pos), Some(0));
    }

    #[test]
    fn test_out_of_bounds_is_unavailable() {
        let mut lattice = DenseLattice::default();
        let far = to_world(LatticeIdx::new([DEFAULT_XY + 10, 0, 0]));

        assert!(!lattice.insert(&far, 0));
        assert!(!lattice.is_occupied(&far));
        assert_eq!(lattice.len(), 0);
    }

    #[test]
    fn test_resize_preserves_cells() {
        let mut lattice = DenseLattice::default();
        let pos = to_world(LatticeIdx::new([3, -2, 5]));
        assert!(lattice.insert(&pos, 0));

        lattice.reserve_bounds(
            LatticeIdx::new([-100, -100, -200]),
            LatticeIdx::new([100, 100, 200]),
        );
        assert_eq!(lattice.find_id(&pos), Some(0));
        assert_eq!(lattice.len(), 1);
    }

    #[test]
    fn test_shrinking_bounds_keeps_cells() {
        let mut lattice = DenseLattice::default();
        let pos = to_world(LatticeIdx::new([10, -8, 12]));
        assert!(lattice.insert(&pos, 0));

        lattice.reserve_bounds(LatticeIdx::new([-1, -1, -1]), LatticeIdx::new([1, 1, 1]));
        assert_eq!(lattice.find_id(&pos), Some(0));
        assert_eq!(lattice.len(), 1);
    }

    #[test]
    fn test_resize_after_lock_is_noop() {
        let mut lattice = DenseLattice::default();
        let slots = lattice.load().slots;

        lattice.lock();
        lattice.reserve_bounds(
            LatticeIdx::new([-100, -100, -200]),
            LatticeIdx::new([100, 100, 200]),
        );
        assert_eq!(lattice.load().slots, slots);
    }

    #[test]
    fn test_unknown_id_sentinel() {
        let lattice = DenseLattice::default();
        assert_eq!(lattice.position_for_id(42), super::super::unknown_position());
    }
}
