//! The overseer: owns the worker pool, drives the launch loop that
//! walks the spawn catalog, and runs a separate supervisory loop for
//! periodic housekeeping (cache sweeps, pipeline commits, status).

use crate::cache::{LongspawnCache, SightingCache};
use crate::catalog::SpawnCatalog;
use crate::config::ScannerConfig;
use crate::pool::AccountPool;
use crate::runtime::RuntimeContext;
use crate::status::{render, StatusSnapshot};
use crate::worker::Worker;
use geoscan_core_geo::{jitter_degrees, Clock, Point, SystemClock};
use geoscan_domain_models::WorkerErrorCode;
use geoscan_infra_db::SystemStateRepository;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTimingOutcome {
    Dispatch,
    /// Already observed this hour and arriving more than 5 s late —
    /// another worker almost certainly already reported this spawn.
    Redundant,
    /// Too late to be worth a visit at all.
    Skipped,
}

/// Pure timing classification pulled out of the launch loop so the
/// skip/redundant policy (spec scenario: late arrivals past
/// `skip_spawn_seconds` are dropped, late-but-already-seen spawns are
/// redundant) can be exercised without a running scheduler.
pub fn classify_spawn_timing(now: i64, spawn_time: i64, already_observed: bool, skip_spawn_seconds: i64) -> SpawnTimingOutcome {
    let elapsed = now - spawn_time;
    if elapsed > 5 && already_observed {
        SpawnTimingOutcome::Redundant
    } else if elapsed > skip_spawn_seconds {
        SpawnTimingOutcome::Skipped
    } else {
        SpawnTimingOutcome::Dispatch
    }
}

pub struct SchedulerStats {
    pub skipped: AtomicU64,
    pub redundant: AtomicU64,
    pub dispatched: AtomicU64,
    pub observation_history: Mutex<std::collections::VecDeque<u64>>,
}

impl Default for SchedulerStats {
    fn default() -> Self {
        Self {
            skipped: AtomicU64::new(0),
            redundant: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            observation_history: Mutex::new(std::collections::VecDeque::with_capacity(10)),
        }
    }
}

pub struct Scheduler {
    pub workers: Vec<Arc<Worker>>,
    semaphore: Arc<Semaphore>,
    pub account_pool: Arc<AccountPool>,
    pub sighting_cache: Arc<SightingCache>,
    pub longspawn_cache: Arc<LongspawnCache>,
    catalog: Mutex<SpawnCatalog>,
    runtime: Arc<RuntimeContext>,
    config: ScannerConfig,
    pub stats: SchedulerStats,
    matcher_search_count: AtomicUsize,
    clock: SystemClock,
    system_state: SystemStateRepository,
}

const HOUR_BASELINE_KEY: &str = "hour_baseline_epoch";

impl Scheduler {
    pub fn new(
        workers: Vec<Arc<Worker>>,
        account_pool: Arc<AccountPool>,
        sighting_cache: Arc<SightingCache>,
        longspawn_cache: Arc<LongspawnCache>,
        catalog: SpawnCatalog,
        runtime: Arc<RuntimeContext>,
        config: ScannerConfig,
        system_state: SystemStateRepository,
    ) -> Arc<Self> {
        let worker_count = workers.len().max(1);
        Arc::new(Self {
            workers,
            semaphore: Arc::new(Semaphore::new(worker_count)),
            account_pool,
            sighting_cache,
            longspawn_cache,
            catalog: Mutex::new(catalog),
            runtime,
            config,
            stats: SchedulerStats::default(),
            matcher_search_count: AtomicUsize::new(0),
            clock: SystemClock,
            system_state,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Top-level launch loop: walks the spawn catalog in offset order,
    /// dispatching a visit at (or just after) each spawn's scheduled
    /// time, filling idle capacity with mystery points in between.
    #[instrument(skip(self))]
    pub async fn run_launch_loop(self: Arc<Self>) {
        let default_baseline = (self.clock.epoch_seconds() / 3600) * 3600;
        let mut hour_baseline = match self.system_state.get_int(HOUR_BASELINE_KEY).await {
            Ok(Some(saved)) if saved <= default_baseline => saved,
            _ => default_baseline,
        };
        let mut resumed = hour_baseline < default_baseline;

        loop {
            if self.runtime.is_killed() {
                return;
            }

            if self.account_pool.captcha_queue_size() > self.config.max_captchas {
                self.runtime.set_paused(true);
                while self.account_pool.captcha_queue_size() > self.config.max_captchas && !self.runtime.is_killed() {
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                self.runtime.set_paused(false);
            }

            let now = self.clock.epoch_seconds();
            let within_hour = now - hour_baseline;

            let after_last = {
                let catalog = self.catalog.lock().await;
                catalog.after_last(within_hour)
            };
            if after_last {
                hour_baseline += 3600;
                if let Err(e) = self.system_state.set_int(HOUR_BASELINE_KEY, hour_baseline).await {
                    warn!("failed to checkpoint hour baseline: {e}");
                }
                self.sighting_cache.clear_observed_spawns();
                resumed = false;
                continue;
            }

            let start_offset = if !resumed {
                resumed = true;
                let catalog = self.catalog.lock().await;
                catalog.get_start_point(within_hour).map(|s| s.offset_in_hour_seconds)
            } else {
                None
            };

            let spawns: Vec<_> = {
                let catalog = self.catalog.lock().await;
                catalog
                    .iter_in_offset_order()
                    .filter(|s| match start_offset {
                        Some(start) => s.offset_in_hour_seconds >= start,
                        None => true,
                    })
                    .cloned()
                    .collect()
            };

            for spawn in spawns {
                if self.runtime.is_killed() {
                    return;
                }

                let spawn_time = hour_baseline + spawn.offset_in_hour_seconds;
                loop {
                    let now = self.clock.epoch_seconds();
                    if now >= spawn_time {
                        break;
                    }
                    let mystery = {
                        let mut catalog = self.catalog.lock().await;
                        catalog.next_mystery()
                    };
                    match mystery {
                        Some(point) => {
                            let this = self.clone();
                            tokio::spawn(async move { this.try_point(point, None).await });
                        }
                        None => {
                            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                        }
                    }
                }

                let now = self.clock.epoch_seconds();
                let already_observed = self.sighting_cache.spawn_observed(&spawn.id);
                match classify_spawn_timing(now, spawn_time, already_observed, self.config.skip_spawn_seconds) {
                    SpawnTimingOutcome::Redundant => {
                        self.stats.redundant.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    SpawnTimingOutcome::Skipped => {
                        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    SpawnTimingOutcome::Dispatch => {}
                }

                let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                self.sighting_cache.mark_spawn_observed(&spawn.id);
                let this = self.clone();
                let point = spawn.point;
                tokio::spawn(async move {
                    this.try_point(point, Some(spawn_time)).await;
                    drop(permit);
                });
            }
        }
    }

    /// Resolves a worker for `point` and issues the visit. Always
    /// releases the worker's busy lock on exit.
    #[instrument(skip(self))]
    async fn try_point(self: Arc<Self>, point: Point, spawn_time: Option<i64>) {
        let jittered = {
            let mut rng = rand::thread_rng();
            jitter_degrees(point, 3.3e-4, 0.0, &mut rng)
        };

        let worker = match self.best_worker(jittered, spawn_time, false).await {
            Some(w) => w,
            None => {
                if spawn_time.is_some() {
                    self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                } else {
                    let mut catalog = self.catalog.lock().await;
                    catalog.push_mystery(jittered);
                }
                return;
            }
        };

        if let Some(spawn_time) = spawn_time {
            let now = self.clock.epoch_seconds();
            if now - spawn_time < 1 {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }

        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        worker.visit(jittered, &self.clock).await;
        // `fast_speed` already excludes captcha-pending workers from
        // future dispatch, so this only fires once per captcha episode.
        if worker.error_code().await == WorkerErrorCode::Captcha {
            self.account_pool.push_captcha(worker.account_snapshot().await);
            warn!("worker {} entered captcha state, queued for resolution", worker.worker_no);
        }
        worker.release_busy();
    }

    /// Maps a point (and optional deadline) to the lowest-speed
    /// eligible, available worker. `must_visit` removes the deadline
    /// entirely (used by bootstrap stage 2).
    #[instrument(skip(self))]
    pub async fn best_worker(&self, point: Point, spawn_time: Option<i64>, must_visit: bool) -> Option<Arc<Worker>> {
        let give_up = if must_visit {
            None
        } else if spawn_time.is_some() {
            Some(std::time::Instant::now() + std::time::Duration::from_secs(self.config.give_up_known_seconds))
        } else {
            Some(std::time::Instant::now() + std::time::Duration::from_secs(self.config.give_up_unknown_seconds))
        };

        let speed_ceiling = self.config.speed_limit_mph * 1.18;

        loop {
            if self.runtime.is_killed() {
                return None;
            }

            let search_no = self.matcher_search_count.fetch_add(1, Ordering::Relaxed);
            let mut order: Vec<usize> = (0..self.workers.len()).collect();
            if search_no % self.config.matcher_shuffle_period == 0 {
                order.shuffle(&mut rand::thread_rng());
            }

            let mut best: Option<(Arc<Worker>, f64)> = None;
            for index in order {
                let worker = &self.workers[index];
                let Some(speed) = worker.fast_speed(point).await else { continue };
                if speed >= speed_ceiling {
                    continue;
                }
                let should_replace = match &best {
                    Some((_, best_speed)) => speed < *best_speed,
                    None => true,
                };
                if should_replace {
                    best = Some((worker.clone(), speed));
                }
            }

            if let Some((candidate, _)) = best {
                if !candidate.busy_acquire_nonblocking() {
                    continue;
                }
                let accurate = candidate.accurate_speed(point).await;
                if accurate <= self.config.speed_limit_mph {
                    return Some(candidate);
                }
                candidate.release_busy();
            }

            match give_up {
                Some(deadline) if std::time::Instant::now() >= deadline => return None,
                _ => tokio::time::sleep(std::time::Duration::from_secs(2)).await,
            }
        }
    }

    /// Runs every ~0.5 s, driving all periodic housekeeping.
    #[instrument(skip(self))]
    pub async fn run_supervisory_loop(self: Arc<Self>) {
        let mut ticks: u64 = 0;
        loop {
            if self.runtime.is_killed() {
                return;
            }
            if self.runtime.is_paused() {
                tokio::time::sleep(std::time::Duration::from_secs(15)).await;
                continue;
            }

            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            ticks += 1;
            let elapsed_secs = ticks / 2;

            if elapsed_secs > 0 && elapsed_secs % 900 == 0 {
                let now = self.clock.epoch_seconds();
                let dropped = self.sighting_cache.clean_expired(now) + self.longspawn_cache.clean_expired(now);
                if dropped > 0 {
                    info!("cache sweep dropped {dropped} expired entries");
                }
            }

            // Each repository write already autocommits at the libSQL
            // driver layer; this tick exists only to mark the commit
            // cadence the rest of the pipeline's failure handling
            // assumes (a bounded staleness window on crash).
            let commit_cadence = self.config.scan_delay_seconds.max(1);
            if elapsed_secs > 0 && elapsed_secs % commit_cadence == 0 {
                tracing::trace!("commit checkpoint reached");
            }

            if elapsed_secs > 0 && elapsed_secs % 600 == 0 && self.account_pool.ready_queue_size() > 0 {
                self.swap_least_productive_worker().await;
            }

            if self.account_pool.ready_queue_size() > 0 {
                self.reap_unhealthy_workers().await;
            }

            if elapsed_secs > 0 && elapsed_secs % 10 == 0 {
                let total: u64 = self.workers.iter().map(|w| w.total_seen_count()).sum();
                let mut history = self.stats.observation_history.lock().await;
                if history.len() == 10 {
                    history.pop_front();
                }
                history.push_back(total);
                drop(history);
                self.recheck_captcha_queue().await;
                self.render_status().await;
            }
        }
    }

    async fn render_status(&self) {
        let mut workers = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            workers.push(worker.snapshot().await);
        }
        let snapshot = StatusSnapshot {
            workers,
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            redundant: self.stats.redundant.load(Ordering::Relaxed),
            dispatched: self.stats.dispatched.load(Ordering::Relaxed),
            captcha_queue_size: self.account_pool.captcha_queue_size(),
            extra_queue_size: self.catalog.lock().await.mysteries_count(),
            paused: self.runtime.is_paused(),
        };
        let line = render(&snapshot);
        if self.config.no_status_bar {
            info!(target: "status", "{line}");
        } else {
            // A redrawn single-line terminal status; `\r` returns to
            // column 0 without a newline so each tick overwrites the last.
            print!("\r{line}");
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
    }

    async fn swap_least_productive_worker(&self) {
        let seen_per_visit = |w: &Arc<Worker>| w.total_seen_count() as f64 / w.visits_count().max(1) as f64;
        let least_productive = self
            .workers
            .iter()
            .min_by(|a, b| seen_per_visit(a).total_cmp(&seen_per_visit(b)));
        let Some(worker) = least_productive else { return };
        let Some(replacement) = self.account_pool.take_ready() else { return };
        let ratio = seen_per_visit(worker);
        let displaced = worker.swap_account("least productive in rolling window", replacement).await;
        self.account_pool.push_ready(displaced);
        warn!("swapped worker {} for under-performing at {ratio:.3} seen/visit", worker.worker_no);
        self.begin_swap_cooldown(worker.clone());
    }

    /// Bad credentials, an account ban, or too many consecutive empty
    /// visits all force an immediate account swap, independent of the
    /// periodic least-productive sweep.
    async fn reap_unhealthy_workers(&self) {
        for worker in &self.workers {
            let code = worker.error_code().await;
            let reason = if matches!(code, WorkerErrorCode::BadLogin) {
                "bad credentials"
            } else if matches!(code, WorkerErrorCode::Banned) {
                "account banned"
            } else if worker.should_swap_for_empty_visits() {
                "too many consecutive empty visits"
            } else {
                continue;
            };
            let Some(replacement) = self.account_pool.take_ready() else {
                continue;
            };
            let displaced = worker.swap_account(reason, replacement).await;
            self.account_pool.push_ready(displaced);
            warn!("worker {} swapped account: {reason}", worker.worker_no);
            self.begin_swap_cooldown(worker.clone());
        }
    }

    /// Re-checks every captcha-pending worker's challenge status and
    /// returns resolved accounts to the ready pool.
    async fn recheck_captcha_queue(&self) {
        if self.account_pool.captcha_queue_size() == 0 {
            return;
        }
        for worker in &self.workers {
            if worker.error_code().await != WorkerErrorCode::Captcha {
                continue;
            }
            if worker.recheck_captcha().await {
                // The account never left the worker — it solved its own
                // challenge using its own authenticated session — so
                // resolving just drops the bookkeeping copy rather than
                // returning a (stale, duplicate) account to the pool.
                let account = worker.account_snapshot().await;
                let _ = self.account_pool.pop_resolved_captcha(&account.username);
                info!("worker {} resolved captcha, resuming normal dispatch", worker.worker_no);
            }
        }
    }

    /// A swapped-in account sits out for 10 s before the matcher can
    /// dispatch it again, mirroring the source's post-swap settle time.
    fn begin_swap_cooldown(&self, worker: Arc<Worker>) {
        worker.force_busy();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            worker.clear_swap_cooldown().await;
        });
    }

    pub async fn kill(&self) {
        self.runtime.kill();
        for worker in &self.workers {
            worker.kill().await;
        }
    }

    pub async fn snapshot_spawns(&self) -> Vec<geoscan_domain_models::Spawn> {
        self.catalog.lock().await.spawns_snapshot()
    }

    pub async fn snapshot_accounts(&self) -> Vec<geoscan_domain_models::Account> {
        let mut accounts = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            accounts.push(worker.account_snapshot().await);
        }
        accounts
    }
}
