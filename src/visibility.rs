use super::{CellId, CellStore, Lattice, NEIGHBOR_COUNT};

use ahash::AHashSet;
use nalgebra::Point3;
use rayon::prelude::*;

/// Batch size for incremental updates; bounds the dedup set and gives
/// rayon reasonable chunks.
pub const UPDATE_CHUNK: usize = 1000;

fn recount<L: Lattice>(lattice: &L, id: CellId) -> u8 {
    lattice
        .occupied_neighbors(&lattice.position_for_id(id))
        .len() as u8
}

fn apply(store: &mut CellStore, counts: impl IntoIterator<Item = (CellId, u8)>) {
    for (id, count) in counts {
        store.set_neighbor_count(id, count);
        store.set_visibility(id, (count as usize) < NEIGHBOR_COUNT);
    }
}

/// Recompute `(neighbor_count, visible)` for every cell. O(N x 14) lookups;
/// on-demand / low-cadence use only.
pub fn full_rescan<L: Lattice>(lattice: &L, store: &mut CellStore) {
    let counts: Vec<u8> = (0..store.len())
        .into_par_iter()
        .map(|id| recount(lattice, id))
        .collect();
    apply(store, counts.into_iter().enumerate());
}

/// Recompute only what one committed batch can have changed: each new cell
/// and the occupied neighbors of each new cell. Adding a cell can only
/// raise its neighbors' counts, so nothing else moves.
///
/// Call after the whole batch is inserted, never mid-batch, or neighbor
/// counts undercount.
pub fn incremental_update<L: Lattice>(
    lattice: &L,
    store: &mut CellStore,
    new_positions: &[Point3<f32>],
) {
    for chunk in new_positions.chunks(UPDATE_CHUNK) {
        let mut affected: AHashSet<CellId> = AHashSet::with_capacity(chunk.len() * NEIGHBOR_COUNT);
        for pos in chunk {
            if let Some(id) = lattice.find_id(pos) {
                affected.insert(id);
            }
            for (nid, _) in lattice.occupied_neighbors(pos) {
                affected.insert(nid);
            }
        }

        let ids: Vec<CellId> = affected.into_iter().collect();
        let counts: Vec<(CellId, u8)> = ids
            .into_par_iter()
            .map(|id| (id, recount(lattice, id)))
            .collect();
        apply(store, counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{neighbor_positions, to_world, HashLattice, LatticeIdx};

    fn filled_center() -> (HashLattice, CellStore) {
        let mut lattice = HashLattice::default();
        let mut store = CellStore::default();
        let center = to_world(LatticeIdx::new([0, 0, 0]));

        let id = store.add();
        lattice.insert(&center, id);
        let mut inserted = vec![center];
        for npos in neighbor_positions(&center) {
            let id = store.add();
            lattice.insert(&npos, id);
            inserted.push(npos);
        }
        incremental_update(&lattice, &mut store, &inserted);
        (lattice, store)
    }

    #[test]
    fn test_enclosed_cell_is_hidden() {
        let (_lattice, store) = filled_center();
        assert_eq!(store.neighbor_count(0), 14);
        assert!(!store.is_visible(0));
        // the shell cells still have open faces
        for id in 1..store.len() {
            assert!(store.neighbor_count(id) < 14);
            assert!(store.is_visible(id));
        }
    }

    #[test]
    fn test_incremental_matches_rescan() {
        let (lattice, store) = filled_center();

        let mut rescanned = CellStore::default();
        for _ in 0..store.len() {
            rescanned.add();
        }
        full_rescan(&lattice, &mut rescanned);

        for id in 0..store.len() {
            assert_eq!(store.neighbor_count(id), rescanned.neighbor_count(id));
            assert_eq!(store.is_visible(id), rescanned.is_visible(id));
        }
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (lattice, mut store) = filled_center();
        let before: Vec<u8> = (0..store.len()).map(|id| store.neighbor_count(id)).collect();
        incremental_update(&lattice, &mut store, &[]);
        for (id, count) in before.into_iter().enumerate() {
            assert_eq!(store.neighbor_count(id), count);
        }
    }
}
