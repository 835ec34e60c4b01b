use nalgebra::Point3;

mod latticeidx;
pub use latticeidx::{
    face_of, neighbor_coords, neighbor_positions, snap, to_lattice, to_world, Face, LatticeIdx,
    HEXAGON_DISTANCE, LAYER_DISTANCE, NEIGHBOR_COUNT, SQUARE_DISTANCE,
};
mod denselattice;
pub use denselattice::DenseLattice;
mod hashlattice;
pub use hashlattice::HashLattice;
mod cellstore;
pub use cellstore::CellStore;
mod boundary;
pub use boundary::{Boundary, BoundaryShape};
mod colony;
pub use colony::{Colony, PlacementStats};
mod growth;
pub use growth::{GrowthConfig, Proposal, SPAWN_CHANCE};
mod visibility;
pub use visibility::{full_rescan, incremental_update, UPDATE_CHUNK};
mod manager;
pub use manager::{ColonyManager, GrowthPhase, SimStats};

/// Dense, monotonically increasing cell identifier. Ids are handed out by
/// the [`CellStore`] at append time and never reused within a run.
pub type CellId = usize;

/// Sentinel world position returned for ids the index has never seen.
pub fn unknown_position() -> Point3<f32> {
    Point3::origin()
}

#[derive(Default, Debug, Clone, Copy)]
pub struct BoundingBox {
    bound_min: LatticeIdx,
    bound_max: LatticeIdx,

    count: usize,
}

impl BoundingBox {
    fn add(&mut self, coord: LatticeIdx) {
        // first cell
        if self.count == 0 {
            self.bound_min = coord;
            self.bound_max = coord;
        } else {
            self.bound_min = coord.bb_min(&self.bound_min);
            self.bound_max = coord.bb_max(&self.bound_max);
        }
        self.count += 1;
    }

    pub fn min(&self) -> LatticeIdx {
        self.bound_min
    }

    pub fn max(&self) -> LatticeIdx {
        self.bound_max
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Advisory occupancy diagnostics for a lattice backend.
#[derive(Debug, Clone, Copy)]
pub struct LatticeLoad {
    /// Allocated slots (dense) or table capacity (hash).
    pub slots: usize,
    pub occupied: usize,
}

impl LatticeLoad {
    pub fn load_factor(&self) -> f32 {
        if self.slots == 0 {
            0.0
        } else {
            self.occupied as f32 / self.slots as f32
        }
    }
}

/// Occupancy index over the truncated-octahedron lattice.
///
/// Two positions that snap to the same [`LatticeIdx`] are the same slot; an
/// insert into an occupied slot is a no-op (first writer wins). Backends
/// must not collide two distinct coordinates onto one stored slot.
pub trait Lattice: Default + Send + Sync {
    /// Size the index to cover `min..=max`. Dense backends reallocate,
    /// widening the request as needed so every stored cell stays
    /// addressable; a call after [`Lattice::lock`] is a silent no-op.
    fn reserve_bounds(&mut self, min: LatticeIdx, max: LatticeIdx);

    /// Freeze the index extent for the rest of the run.
    fn lock(&mut self);

    /// Record `pos -> id` and `id -> pos`. Returns false if the slot is
    /// already occupied or lies outside the sized extent.
    fn insert(&mut self, pos: &Point3<f32>, id: CellId) -> bool;

    fn is_occupied(&self, pos: &Point3<f32>) -> bool;

    fn find_id(&self, pos: &Point3<f32>) -> Option<CellId>;

    /// O(1) reverse lookup. Unknown ids yield [`unknown_position`].
    fn position_for_id(&self, id: CellId) -> Point3<f32>;

    /// Number of inserted cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bounding_box(&self) -> &BoundingBox;

    fn load(&self) -> LatticeLoad;

    /// The occupied subset of the 14 neighbor slots, as `(id, position)`.
    fn occupied_neighbors(&self, pos: &Point3<f32>) -> Vec<(CellId, Point3<f32>)> {
        let mut out = Vec::with_capacity(NEIGHBOR_COUNT);
        for npos in neighbor_positions(pos) {
            if let Some(id) = self.find_id(&npos) {
                out.push((id, npos));
            }
        }
        out
    }

    /// The unoccupied subset of the 14 neighbor slots. Boundary filtering
    /// is layered on top by the growth step, not here.
    fn available_neighbors(&self, pos: &Point3<f32>) -> Vec<Point3<f32>> {
        let mut out = Vec::with_capacity(NEIGHBOR_COUNT);
        for npos in neighbor_positions(pos) {
            if !self.is_occupied(&npos) {
                out.push(npos);
            }
        }
        out
    }
}
