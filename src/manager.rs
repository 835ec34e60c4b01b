use super::{
    growth, snap, to_lattice, Boundary, CellId, Colony, GrowthConfig, Lattice, LatticeLoad,
    PlacementStats, Proposal,
};

use log::*;
use nalgebra::Point3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// extra index extent beyond the boundary box, absorbs mapping drift at the
// edges
const GRID_MARGIN: f32 = 0.2;
const GRID_PAD: [i32; 3] = [2, 2, 4];

const STORE_RESERVE: usize = 2_000_000;
const STOP_DEADLINE: Duration = Duration::from_secs(2);
const STOP_POLL: Duration = Duration::from_millis(1);
const LOAD_WARN_THRESHOLD: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthPhase {
    Idle,
    Running,
    Stopping,
}

/// Observability snapshot for the UI layer.
#[derive(Debug, Clone, Copy)]
pub struct SimStats {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
    pub placements: PlacementStats,
    pub load: LatticeLoad,
}

/// Owns the colony, the boundary, and the background growth loop.
///
/// Two actors touch simulation state: the spawned worker evaluates growth
/// ticks read-only and pushes proposals into the pending queue; the caller
/// (typically the render loop) drains the queue and applies it, and is the
/// only writer of the lattice and store. The queue mutex guards nothing but
/// the handoff.
pub struct ColonyManager<L: Lattice + 'static> {
    colony: Arc<RwLock<Colony<L>>>,
    boundary: Boundary,
    pending: Arc<Mutex<Vec<Proposal>>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    config: GrowthConfig,
    phase: GrowthPhase,
}

impl<L: Lattice + 'static> ColonyManager<L> {
    /// Manager with a single seed cell at the boundary center.
    pub fn new(boundary: Boundary, config: GrowthConfig) -> Self {
        let mut out = Self {
            colony: Arc::new(RwLock::new(Colony::default())),
            boundary,
            pending: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            config,
            phase: GrowthPhase::Idle,
        };
        // size before seeding: a dense index at its default extent would
        // drop a seed far from the origin
        out.size_index();
        let center = out.boundary.center();
        out.seed_cells(&[center]);
        out
    }

    fn seed_cells(&mut self, seeds: &[Point3<f32>]) {
        let mut colony = self.colony.write().unwrap();
        for pos in seeds {
            colony.seed(&snap(pos));
        }
    }

    /// Freeze the boundary, size the index once, and spawn the growth loop.
    /// No-op while already running.
    pub fn start_growth(&mut self) {
        if self.worker.is_some() {
            return;
        }

        self.boundary.lock_size();
        self.size_index();
        {
            let mut colony = self.colony.write().unwrap();
            colony.lattice_mut().lock();
            colony.reserve(STORE_RESERVE);
        }

        self.running.store(true, Ordering::SeqCst);
        let colony = Arc::clone(&self.colony);
        let pending = Arc::clone(&self.pending);
        let running = Arc::clone(&self.running);
        let boundary = self.boundary.clone();
        let config = self.config;

        self.worker = Some(thread::spawn(move || {
            let intensity = config.intensity();
            let mut tick = 0u64;
            while running.load(Ordering::Relaxed) {
                let proposals = {
                    let colony = colony.read().unwrap();
                    growth::step(colony.lattice(), &boundary, intensity, config.seed, tick)
                };
                tick += 1;

                if !proposals.is_empty() {
                    pending.lock().unwrap().extend(proposals);
                }
                // cooperative yield point; also where the stop flag gets
                // observed promptly
                thread::sleep(config.tick_interval);
            }
            debug!("growth worker exiting after {} ticks", tick);
        }));
        self.phase = GrowthPhase::Running;
        info!("growth started, intensity={:.4}/tick", self.config.intensity());
    }

    /// Size the index from the boundary box with a safety margin. Safe to
    /// call repeatedly while the index is unlocked; backends keep existing
    /// cells addressable across resizes.
    fn size_index(&mut self) {
        let (lo, hi) = self.boundary.aabb();
        let center = self.boundary.center();
        let lo = center + (lo - center) * (1.0 + GRID_MARGIN);
        let hi = center + (hi - center) * (1.0 + GRID_MARGIN);

        let lo = to_lattice(&lo).offset([-GRID_PAD[0], -GRID_PAD[1], -GRID_PAD[2]]);
        let hi = to_lattice(&hi).offset(GRID_PAD);

        let mut colony = self.colony.write().unwrap();
        colony.lattice_mut().reserve_bounds(lo, hi);
        debug!("index sized to {:?}..{:?}", lo.idx, hi.idx);
    }

    /// Raise the stop flag, wait out the worker (bounded), and discard
    /// whatever the final partial tick left in the queue.
    pub fn stop_growth(&mut self) {
        let handle = match self.worker.take() {
            Some(handle) => handle,
            None => return,
        };
        self.phase = GrowthPhase::Stopping;
        self.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + STOP_DEADLINE;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(STOP_POLL);
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                warn!("growth worker panicked; state keeps the last applied batch");
            }
        } else {
            // best-effort shutdown: a stuck join must not wedge the caller
            warn!(
                "growth worker still running after {:?}, abandoning join",
                STOP_DEADLINE
            );
        }

        self.pending.lock().unwrap().clear();
        self.phase = GrowthPhase::Idle;
    }

    /// True while the worker is both started and alive. A worker that died
    /// on its own (panic) reports inactive even before [`Self::stop_growth`]
    /// cleans up.
    pub fn is_growth_active(&self) -> bool {
        self.phase == GrowthPhase::Running
            && self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn phase(&self) -> GrowthPhase {
        self.phase
    }

    /// Swap the pending queue out under its lock, then commit and update
    /// visibility outside it. Returns the number of cells added; an empty
    /// queue is a strict no-op.
    pub fn drain_and_apply(&mut self) -> usize {
        let batch = {
            let mut pending = self.pending.lock().unwrap();
            std::mem::take(&mut *pending)
        };
        if batch.is_empty() {
            return 0;
        }

        let mut colony = self.colony.write().unwrap();
        let applied = colony.apply(&batch, &self.boundary);

        let load = colony.load();
        if load.load_factor() > LOAD_WARN_THRESHOLD {
            warn!(
                "lattice load factor {:.2} ({}/{} slots)",
                load.load_factor(),
                load.occupied,
                load.slots
            );
        }
        applied
    }

    /// Discard all cells, install a fresh boundary, and re-seed. With no
    /// explicit seeds, one cell at the new boundary's center.
    pub fn reset_all(&mut self, boundary: Boundary, seeds: &[Point3<f32>]) {
        self.stop_growth();
        *self.colony.write().unwrap() = Colony::default();
        self.boundary = boundary;
        self.size_index();

        let center = self.boundary.center();
        if seeds.is_empty() {
            self.seed_cells(&[center]);
        } else {
            self.seed_cells(seeds);
        }
        info!("reset, {} seed cell(s)", self.size());
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Pre-lock boundary adjustments (resize, enable, visibility) go
    /// through here; every mutator no-ops once the size is locked.
    pub fn boundary_mut(&mut self) -> &mut Boundary {
        &mut self.boundary
    }

    pub fn size(&self) -> usize {
        self.colony.read().unwrap().len()
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.colony.read().unwrap().store().is_visible(id)
    }

    pub fn neighbor_count(&self, id: CellId) -> u8 {
        self.colony.read().unwrap().store().neighbor_count(id)
    }

    pub fn position_for_id(&self, id: CellId) -> Point3<f32> {
        self.colony.read().unwrap().lattice().position_for_id(id)
    }

    /// Every visible cell as `(id, position, neighbor_count)`; the renderer
    /// groups them however it likes (typically by count for color-coding).
    pub fn visible_cells(&self) -> Vec<(CellId, Point3<f32>, u8)> {
        let colony = self.colony.read().unwrap();
        let store = colony.store();
        (0..store.len())
            .filter(|&id| store.is_visible(id))
            .map(|id| {
                (
                    id,
                    colony.lattice().position_for_id(id),
                    store.neighbor_count(id),
                )
            })
            .collect()
    }

    pub fn stats(&self) -> SimStats {
        let colony = self.colony.read().unwrap();
        let visible = colony.visible_count();
        SimStats {
            total: colony.len(),
            visible,
            hidden: colony.len() - visible,
            placements: colony.stats(),
            load: colony.load(),
        }
    }
}

impl<L: Lattice + 'static> Drop for ColonyManager<L> {
    fn drop(&mut self) {
        self.stop_growth();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashLattice;

    #[test]
    fn test_dead_worker_reports_inactive() {
        let mut manager =
            ColonyManager::<HashLattice>::new(Boundary::default(), GrowthConfig::default());
        manager.start_growth();
        assert!(manager.is_growth_active());

        // make the worker exit on its own, without the manager's knowledge
        manager.running.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(2);
        while manager.worker.as_ref().is_some_and(|h| !h.is_finished())
            && Instant::now() < deadline
        {
            thread::sleep(Duration::from_millis(1));
        }

        // the phase has not been told yet, but activity reflects reality
        assert_eq!(manager.phase(), GrowthPhase::Running);
        assert!(!manager.is_growth_active());
        manager.stop_growth();
        assert_eq!(manager.phase(), GrowthPhase::Idle);
    }
}
