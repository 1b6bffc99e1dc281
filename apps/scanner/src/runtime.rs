//! `RuntimeContext` bundles the process-wide mutable state that the
//! original implementation kept as module-level globals (`START_TIME`,
//! `LAST_LOGIN`, `CELL_IDS`, per-proxy circuit timestamps, the kill
//! flag). Everything here is cheap to clone (an `Arc` bundle) and
//! handed to every worker and to the scheduler.

use dashmap::DashMap;
use geoscan_core_geo::Point;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Gates logins so at most `simultaneous_logins` workers authenticate
/// concurrently, each separated from the last by a random 3-6 s gap.
pub struct LoginGate {
    last_login_epoch: AtomicI64,
    permits: tokio::sync::Semaphore,
}

impl LoginGate {
    pub fn new(simultaneous_logins: usize) -> Self {
        Self {
            last_login_epoch: AtomicI64::new(0),
            permits: tokio::sync::Semaphore::new(simultaneous_logins),
        }
    }

    /// Blocks until a login slot is free and the minimum inter-login
    /// gap since the last login has elapsed, then records this login's
    /// timestamp before releasing the caller.
    pub async fn acquire(&self, clock: &dyn geoscan_core_geo::Clock) {
        let _permit = self.permits.acquire().await.expect("semaphore never closed");
        loop {
            let now = clock.epoch_seconds();
            let last = self.last_login_epoch.load(Ordering::SeqCst);
            let gap = rand::random::<f64>() * 3.0 + 3.0;
            if (now - last) as f64 >= gap {
                self.last_login_epoch.store(now, Ordering::SeqCst);
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }
    }
}

/// Process-wide cell-ID cache, keyed by the 5-decimal rounded
/// coordinate. Writes are idempotent (same input always yields the
/// same output) so concurrent writers racing to fill the same key is
/// harmless — last writer wins and both wrote the same value.
pub type CellIdCache = DashMap<(i64, i64), Vec<i64>>;

pub struct RuntimeContext {
    pub start_time_epoch: i64,
    pub login_gate: LoginGate,
    pub cell_ids: CellIdCache,
    pub kill_flag: AtomicBool,
    pub paused: AtomicBool,
    /// Serializes proxy-circuit-rotation decisions so two workers
    /// sharing a proxy can't both decide to rotate it at once.
    pub circuit_control: Mutex<()>,
}

impl RuntimeContext {
    pub fn new(simultaneous_logins: usize) -> Arc<Self> {
        Arc::new(Self {
            start_time_epoch: geoscan_core_geo::epoch_seconds(),
            login_gate: LoginGate::new(simultaneous_logins),
            cell_ids: DashMap::new(),
            kill_flag: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            circuit_control: Mutex::new(()),
        })
    }

    pub fn is_killed(&self) -> bool {
        self.kill_flag.load(Ordering::SeqCst)
    }

    pub fn kill(&self) {
        self.kill_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::SeqCst);
    }

    pub fn cell_ids_for(&self, point: Point, compute: impl FnOnce() -> Vec<i64>) -> Vec<i64> {
        let key = point.rounded_key();
        if let Some(existing) = self.cell_ids.get(&key) {
            return existing.clone();
        }
        let computed = compute();
        self.cell_ids.insert(key, computed.clone());
        computed
    }
}
