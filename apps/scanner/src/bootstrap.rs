//! Initial coverage sweep used to discover spawns before regular
//! scheduling begins. Stage 1 gives every worker one guaranteed visit
//! to the center of its assigned grid cell; stage 2 fills remaining
//! visibility gaps with a denser interior grid, no deadline attached.

use crate::scheduler::Scheduler;
use geoscan_core_geo::{partition, GridSpec, Point, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The denser interior grid stage 2 sweeps, scaled by `density_multiplier`
/// on each axis independently of stage 1's worker-count partition.
pub fn interior_grid(grid: GridSpec, density_multiplier: usize) -> GridSpec {
    GridSpec::new(
        grid.rows * density_multiplier.max(1),
        grid.cols * density_multiplier.max(1),
        grid.map_start,
        grid.map_end,
    )
}

pub struct Bootstrap;

impl Bootstrap {
    /// Dispatches one visit per worker to its grid cell center, spaced
    /// 0.25 s apart, then waits until at least half the workers report
    /// idle (not busy) before returning.
    #[instrument(skip(scheduler, grid))]
    pub async fn stage_one(scheduler: Arc<Scheduler>, grid: GridSpec) {
        let cell_count = grid.cell_count();
        let centers = partition(&grid, cell_count);
        info!("bootstrap stage 1: dispatching {} grid-cell visits", centers.len());

        for (worker_no, center) in centers.into_iter().enumerate() {
            let scheduler = scheduler.clone();
            let Some(worker) = scheduler.workers.get(worker_no).cloned() else { continue };
            tokio::spawn(async move {
                if worker.busy_acquire_nonblocking() {
                    worker.bootstrap_visit(center, &SystemClock).await;
                    worker.release_busy();
                }
            });
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        let worker_count = scheduler.workers.len();
        loop {
            // `busy_acquire_nonblocking` both checks and claims; only
            // workers that were genuinely idle (and so got claimed here)
            // are released again — a worker that's busy because it's
            // mid-visit must keep holding its own lock.
            let mut idle = 0;
            let mut acquired = Vec::new();
            for worker in &scheduler.workers {
                if worker.busy_acquire_nonblocking() {
                    idle += 1;
                    acquired.push(worker.clone());
                }
            }
            for worker in acquired {
                worker.release_busy();
            }
            if idle * 2 >= worker_count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    /// Covers visibility gaps left by stage 1 with a denser interior
    /// grid, routed through the ordinary matcher with no spawn-time
    /// deadline (`must_visit = true`).
    #[instrument(skip(scheduler, grid))]
    pub async fn stage_two(scheduler: Arc<Scheduler>, grid: GridSpec, density_multiplier: usize) {
        let interior = interior_grid(grid, density_multiplier);
        let points: Vec<Point> = partition(&interior, interior.cell_count());
        info!("bootstrap stage 2: covering {} interior points", points.len());

        for point in points {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                if let Some(worker) = scheduler.best_worker(point, None, true).await {
                    worker.visit(point, &SystemClock).await;
                    worker.release_busy();
                }
            });
        }
    }
}
