use super::{
    growth, incremental_update, snap, Boundary, CellId, CellStore, Face, Lattice, LatticeLoad,
    Proposal,
};

use nalgebra::Point3;

/// Counters kept by the commit path. Recorded explicitly when proposals
/// land, so query paths stay pure.
#[derive(Default, Debug, Clone, Copy)]
pub struct PlacementStats {
    pub square_faces: usize,
    pub hexagon_faces: usize,
    pub rejected_out_of_boundary: usize,
    pub dropped_duplicates: usize,
}

/// Lattice index plus cell store under one single-writer owner.
///
/// Everything here is mutated from exactly one context at a time: either a
/// synchronous driver or the manager's consumer-side apply step. The
/// background growth loop only ever reads it.
#[derive(Default)]
pub struct Colony<L: Lattice> {
    lattice: L,
    store: CellStore,
    stats: PlacementStats,
    tick: u64,
}

impl<L: Lattice> Colony<L> {
    pub fn lattice(&self) -> &L {
        &self.lattice
    }

    pub fn lattice_mut(&mut self) -> &mut L {
        &mut self.lattice
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn reserve(&mut self, n: usize) {
        self.store.reserve(n);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> PlacementStats {
        self.stats
    }

    pub fn load(&self) -> LatticeLoad {
        self.lattice.load()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Place an initial cell, bypassing the boundary predicate. No-op on an
    /// occupied slot, like any insert.
    pub fn seed(&mut self, pos: &Point3<f32>) -> Option<CellId> {
        let pos = snap(pos);
        let id = self.store.len();
        if !self.lattice.insert(&pos, id) {
            return None;
        }
        self.store.add();
        incremental_update(&self.lattice, &mut self.store, &[pos]);
        Some(id)
    }

    /// Serialized commit of one batch of proposals: boundary check, then
    /// first-writer-wins insert, then store append. Returns the positions
    /// actually added; visibility is NOT updated here so a caller can
    /// combine batches (see [`Colony::apply`]).
    pub fn commit(&mut self, proposals: &[Proposal], boundary: &Boundary) -> Vec<Point3<f32>> {
        let mut added = Vec::with_capacity(proposals.len());
        for p in proposals {
            if !boundary.contains(&p.pos) {
                self.stats.rejected_out_of_boundary += 1;
                continue;
            }

            let id = self.store.len();
            if !self.lattice.insert(&p.pos, id) {
                self.stats.dropped_duplicates += 1;
                continue;
            }
            self.store.add();
            match p.face {
                Face::Square => self.stats.square_faces += 1,
                Face::Hexagon => self.stats.hexagon_faces += 1,
            }
            added.push(p.pos);
        }
        added
    }

    /// Commit a batch and bring visibility up to date for it. Visibility
    /// runs only after every insert of the batch has landed.
    pub fn apply(&mut self, proposals: &[Proposal], boundary: &Boundary) -> usize {
        let added = self.commit(proposals, boundary);
        incremental_update(&self.lattice, &mut self.store, &added);
        added.len()
    }

    /// One synchronous growth tick: evaluate and apply in place. The
    /// threaded path in [`crate::ColonyManager`] splits these two halves
    /// across the worker and consumer instead.
    pub fn step_sync(&mut self, boundary: &Boundary, intensity: f32, seed: u64) -> usize {
        let proposals = growth::step(&self.lattice, boundary, intensity, seed, self.tick);
        self.tick += 1;
        self.apply(&proposals, boundary)
    }

    pub fn visible_count(&self) -> usize {
        self.store.visible_count()
    }

    pub fn hidden_count(&self) -> usize {
        self.store.len() - self.store.visible_count()
    }
}
