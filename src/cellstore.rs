use super::CellId;

/// Append-only columnar store of per-cell derived attributes.
///
/// Ids are the append order; records are created visible with zero known
/// neighbors and only the visibility updater mutates them afterwards. All
/// mutation happens from the single consumer-side apply step, so there is
/// no internal locking.
#[derive(Default)]
pub struct CellStore {
    visible: Vec<bool>,
    neighbor_counts: Vec<u8>,
}

impl CellStore {
    pub fn reserve(&mut self, n: usize) {
        self.visible.reserve(n);
        self.neighbor_counts.reserve(n);
    }

    /// Append a record and return its id (the pre-append size).
    pub fn add(&mut self) -> CellId {
        let id = self.visible.len();
        self.visible.push(true);
        self.neighbor_counts.push(0);
        id
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn set_visibility(&mut self, id: CellId, visible: bool) {
        self.visible[id] = visible;
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.visible[id]
    }

    pub fn set_neighbor_count(&mut self, id: CellId, count: u8) {
        self.neighbor_counts[id] = count;
    }

    pub fn neighbor_count(&self, id: CellId) -> u8 {
        self.neighbor_counts[id]
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_returns_dense_ids() {
        let mut store = CellStore::default();
        assert_eq!(store.add(), 0);
        assert_eq!(store.add(), 1);
        assert_eq!(store.add(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_defaults_visible_with_zero_neighbors() {
        let mut store = CellStore::default();
        let id = store.add();
        assert!(store.is_visible(id));
        assert_eq!(store.neighbor_count(id), 0);
    }

    #[test]
    fn test_mutators() {
        let mut store = CellStore::default();
        let id = store.add();

        store.set_neighbor_count(id, 14);
        store.set_visibility(id, false);
        assert_eq!(store.neighbor_count(id), 14);
        assert!(!store.is_visible(id));
        assert_eq!(store.visible_count(), 0);
    }
}
