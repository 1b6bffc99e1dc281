//! One account-bound agent responsible for sequential visits. Visits
//! never overlap for a given worker (`busy_lock`); everything else —
//! which worker gets which point — is the scheduler's job.

use crate::config::{EncounterMode, ScannerConfig};
use crate::notifier::Notifier;
use crate::pool::ProxyPool;
use crate::runtime::RuntimeContext;
use geoscan_core_geo::{distance, jitter_degrees, Clock, Point};
use geoscan_domain_models::{
    Account, AccountAuthState, Landmark, PipelineItem, Proxy, Sighting, WorkerErrorCode,
};
use geoscan_infra_upstream::{UpstreamClient, UpstreamError};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, instrument, warn};

/// The source occasionally sees `time_till_hidden` fall outside the
/// sane `[0, 3_600_000]` ms range; 901 s is the magic sentinel it falls
/// back to, preserved here as a named constant (open question b).
pub const LONG_SPAWN_SENTINEL_SECS: i64 = 901;

const MAX_CONSECUTIVE_EMPTY_VISITS: u32 = 20;
const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// The outcome of one visit attempt, modeled as data rather than an
/// exception so the retry envelope and the scheduler can branch on it
/// without a `catch` per failure mode.
#[derive(Debug)]
pub enum WorkerOutcome {
    Visited { encounters_seen: usize },
    Captcha { challenge_url: String },
    Banned,
    IpBanned,
    BadLogin,
    Throttled,
    Malformed,
    Killed,
}

struct LastVisit {
    point: Point,
    at_monotonic: std::time::Instant,
}

pub struct Worker {
    pub worker_no: usize,
    account: Mutex<Account>,
    proxy: Mutex<Option<Proxy>>,
    busy: AtomicBool,
    error_code: Mutex<WorkerErrorCode>,
    last_visit: Mutex<Option<LastVisit>>,
    empty_visits: AtomicU32,
    total_seen: AtomicU64,
    visits: AtomicU64,
    upstream: Mutex<Box<dyn UpstreamClient>>,
    runtime: Arc<RuntimeContext>,
    proxy_pool: Arc<ProxyPool>,
    pipeline: mpsc::Sender<PipelineItem>,
    notifier: Arc<Notifier>,
    notify_ids: Vec<u32>,
    notify_enabled: bool,
    encounter_mode: EncounterMode,
    spin_pokestops: bool,
    spin_cooldown_seconds: i64,
    max_retries: u32,
    last_spin: Mutex<Option<std::time::Instant>>,
    pending_challenge: Mutex<Option<String>>,
}

impl Worker {
    pub fn new(
        worker_no: usize,
        account: Account,
        proxy: Option<Proxy>,
        upstream: Box<dyn UpstreamClient>,
        runtime: Arc<RuntimeContext>,
        proxy_pool: Arc<ProxyPool>,
        pipeline: mpsc::Sender<PipelineItem>,
        notifier: Arc<Notifier>,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            worker_no,
            account: Mutex::new(account),
            proxy: Mutex::new(proxy),
            busy: AtomicBool::new(false),
            error_code: Mutex::new(WorkerErrorCode::Ok),
            last_visit: Mutex::new(None),
            empty_visits: AtomicU32::new(0),
            total_seen: AtomicU64::new(0),
            visits: AtomicU64::new(0),
            upstream: Mutex::new(upstream),
            runtime,
            proxy_pool,
            pipeline,
            notifier,
            notify_ids: config.notify_ids.clone(),
            notify_enabled: config.notify,
            encounter_mode: config.encounter,
            spin_pokestops: config.spin_pokestops,
            spin_cooldown_seconds: config.spin_cooldown_seconds,
            max_retries: config.max_retries.max(1),
            last_spin: Mutex::new(None),
            pending_challenge: Mutex::new(None),
        }
    }

    pub fn busy_acquire_nonblocking(&self) -> bool {
        self.busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }

    pub fn release_busy(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Forces the busy flag on regardless of the current visit state,
    /// used to hold a freshly swapped-in account out of dispatch for its
    /// settle period even if the swap raced with an in-flight visit.
    pub fn force_busy(&self) {
        self.busy.store(true, Ordering::SeqCst);
    }

    /// Coarse eligibility check used by the matcher to rank candidates
    /// before committing to one: rejects busy workers, captcha-pending
    /// workers, and workers visited too recently.
    pub async fn fast_speed(&self, point: Point) -> Option<f64> {
        if self.busy.load(Ordering::SeqCst) {
            return None;
        }
        if matches!(*self.error_code.lock().await, WorkerErrorCode::Captcha) {
            return None;
        }
        let guard = self.last_visit.lock().await;
        match &*guard {
            None => Some(1.0),
            Some(last) => {
                let elapsed = last.at_monotonic.elapsed().as_secs_f64();
                if elapsed < 10.0 {
                    return None;
                }
                Some(distance::mph(last.point, point, elapsed))
            }
        }
    }

    /// The strict, post-acquire check: same formula, no early exits.
    pub async fn accurate_speed(&self, point: Point) -> f64 {
        let guard = self.last_visit.lock().await;
        match &*guard {
            None => 0.0,
            Some(last) => {
                let elapsed = last.at_monotonic.elapsed().as_secs_f64().max(1.0);
                distance::mph(last.point, point, elapsed)
            }
        }
    }

    pub async fn snapshot(&self) -> geoscan_domain_models::WorkerSnapshot {
        let account = self.account.lock().await;
        let masked = mask_username(&account.username);
        let last = self.last_visit.lock().await;
        let (lat, lon) = last.as_ref().map(|l| (l.point.lat, l.point.lon)).unwrap_or((0.0, 0.0));
        geoscan_domain_models::WorkerSnapshot {
            worker_no: self.worker_no,
            username_masked: masked,
            error_code: *self.error_code.lock().await,
            last_lat: lat,
            last_lon: lon,
            total_seen: self.total_seen.load(Ordering::Relaxed),
            visits: self.visits.load(Ordering::Relaxed),
            speed_mph: 0.0,
            empty_visit_count: self.empty_visits.load(Ordering::Relaxed),
        }
    }

    #[instrument(skip(self, clock), fields(worker_no = self.worker_no))]
    async fn ensure_logged_in(&self, clock: &dyn Clock) -> Result<(), WorkerOutcome> {
        {
            let account = self.account.lock().await;
            if account.auth_state == AccountAuthState::LoggedIn {
                return Ok(());
            }
        }

        for attempt in 0..MAX_LOGIN_ATTEMPTS {
            self.runtime.login_gate.acquire(clock).await;

            let (username, password, provider) = {
                let account = self.account.lock().await;
                (account.username.clone(), account.password.clone(), account.provider.clone())
            };

            let mut upstream = self.upstream.lock().await;
            match upstream.set_authentication(&username, &password, &provider).await {
                Ok(()) => {
                    drop(upstream);
                    let mut account = self.account.lock().await;
                    account.auth_state = AccountAuthState::LoggedIn;
                    return Ok(());
                }
                Err(UpstreamError::Forbidden) => {
                    drop(upstream);
                    warn!("login forbidden (ip ban), attempt {attempt}");
                    self.sleep_category(&UpstreamError::Forbidden).await;
                }
                Err(UpstreamError::AuthFailed) => {
                    drop(upstream);
                    let mut account = self.account.lock().await;
                    account.auth_state = AccountAuthState::BadCredentials;
                    return Err(WorkerOutcome::BadLogin);
                }
                Err(other) => {
                    drop(upstream);
                    self.sleep_category(&other).await;
                }
            }
        }
        Err(WorkerOutcome::BadLogin)
    }

    /// Pokestops seen again inside `spin_cooldown_seconds` of the last
    /// spin are not re-spun; keeps a chatty worker from hammering the
    /// same stop every visit.
    async fn spin_cooldown_elapsed(&self, clock: &dyn Clock) -> bool {
        let mut last = self.last_spin.lock().await;
        let ready = match *last {
            None => true,
            Some(at) => at.elapsed().as_secs() as i64 >= self.spin_cooldown_seconds,
        };
        if ready {
            *last = Some(clock.monotonic());
        }
        ready
    }

    /// Feeds this visit's latency and success/failure into the bound
    /// proxy's rolling health signal, then rotates its circuit if the
    /// health thresholds are crossed and the rate limit allows it.
    async fn record_proxy_outcome(&self, success: bool, latency_secs: f64, clock: &dyn Clock) {
        let Some(url) = self.proxy.lock().await.as_ref().map(|p| p.url.clone()) else {
            return;
        };
        self.proxy_pool.record_latency(&url, latency_secs);
        if success {
            self.proxy_pool.record_success(&url);
        } else {
            self.proxy_pool.record_failure(&url);
        }
        self.rotate_proxy_if_due(&url, false, clock).await;
    }

    /// An explicit IP ban always rotates, independent of the rolling
    /// health signal (still subject to the per-proxy rate limit).
    async fn force_rotate_proxy(&self, clock: &dyn Clock) {
        let Some(url) = self.proxy.lock().await.as_ref().map(|p| p.url.clone()) else {
            return;
        };
        self.rotate_proxy_if_due(&url, true, clock).await;
    }

    async fn rotate_proxy_if_due(&self, current_url: &str, force: bool, clock: &dyn Clock) {
        // Serializes rotation against whatever external circuit-control
        // socket the deployment configures; a no-op here beyond the lock
        // itself, since that socket is an out-of-scope collaborator.
        let _circuit_guard = self.runtime.circuit_control.lock().await;
        if let Some(fresh) = self.proxy_pool.maybe_rotate(current_url, force, clock.epoch_seconds()) {
            info!("worker {} rotating proxy circuit ({})", self.worker_no, if force { "ip ban" } else { "health" });
            *self.proxy.lock().await = Some(fresh);
        }
    }

    async fn sleep_category(&self, error: &UpstreamError) {
        let (low, high) = error.sleep_floor_seconds();
        let seconds = rand::thread_rng().gen_range(low..=high);
        tokio::time::sleep(std::time::Duration::from_secs_f64(seconds)).await;
    }

    /// Runs the full visit state machine for one point, including the
    /// retry envelope. Returns true if the visit ultimately succeeded.
    #[instrument(skip(self, clock), fields(worker_no = self.worker_no))]
    pub async fn visit(&self, point: Point, clock: &dyn Clock) -> bool {
        if self.runtime.is_killed() {
            *self.error_code.lock().await = WorkerErrorCode::Killed;
            return false;
        }

        if let Err(outcome) = self.ensure_logged_in(clock).await {
            self.apply_outcome(&outcome).await;
            return false;
        }

        {
            let mut upstream = self.upstream.lock().await;
            let _ = upstream.set_position(point.lat, point.lon, point.alt).await;
            if let Some(proxy) = &*self.proxy.lock().await {
                let _ = upstream.set_proxy(Some(&proxy.url)).await;
            }
        }

        let mut consecutive_malformed = 0u32;
        for attempt in 0..self.max_retries {
            if self.runtime.is_killed() {
                *self.error_code.lock().await = WorkerErrorCode::Killed;
                return false;
            }
            let started_at = std::time::Instant::now();
            match self.visit_body(point, clock).await {
                Ok(outcome @ WorkerOutcome::Visited { encounters_seen }) => {
                    self.record_proxy_outcome(encounters_seen > 0, started_at.elapsed().as_secs_f64(), clock).await;
                    self.apply_outcome(&outcome).await;
                    return true;
                }
                Ok(outcome @ WorkerOutcome::Captcha { .. }) => {
                    if let WorkerOutcome::Captcha { challenge_url } = &outcome {
                        *self.pending_challenge.lock().await = Some(challenge_url.clone());
                    }
                    self.apply_outcome(&outcome).await;
                    return false;
                }
                Ok(outcome) => {
                    self.apply_outcome(&outcome).await;
                    return false;
                }
                Err(error) => {
                    warn!("visit attempt {attempt} failed: {error}");
                    // Forbidden and Banned are terminal: no number of
                    // retries changes an IP ban or account ban. Malformed
                    // responses are retried twice before being surfaced,
                    // since a single bad frame is usually transient.
                    match error {
                        UpstreamError::Forbidden => {
                            self.force_rotate_proxy(clock).await;
                            self.apply_outcome(&WorkerOutcome::IpBanned).await;
                            return false;
                        }
                        UpstreamError::Banned => {
                            self.apply_outcome(&WorkerOutcome::Banned).await;
                            return false;
                        }
                        UpstreamError::Throttled => {
                            self.sleep_category(&error).await;
                            self.apply_outcome(&WorkerOutcome::Throttled).await;
                        }
                        UpstreamError::Malformed(_) => {
                            consecutive_malformed += 1;
                            if consecutive_malformed >= 2 {
                                self.apply_outcome(&WorkerOutcome::Malformed).await;
                                return false;
                            }
                            self.sleep_category(&error).await;
                        }
                        _ => {
                            self.sleep_category(&error).await;
                        }
                    }
                }
            }
        }
        false
    }

    /// Used by the bootstrap stage: a visit with no spawn-time deadline
    /// and no notion of "redundant"; otherwise identical.
    pub async fn bootstrap_visit(&self, point: Point, clock: &dyn Clock) -> bool {
        self.visit(point, clock).await
    }

    async fn apply_outcome(&self, outcome: &WorkerOutcome) {
        let mut code = self.error_code.lock().await;
        *code = match outcome {
            WorkerOutcome::Visited { .. } => WorkerErrorCode::Ok,
            WorkerOutcome::Captcha { .. } => WorkerErrorCode::Captcha,
            WorkerOutcome::Banned => WorkerErrorCode::Banned,
            WorkerOutcome::IpBanned => WorkerErrorCode::IpBanned,
            WorkerOutcome::BadLogin => WorkerErrorCode::BadLogin,
            WorkerOutcome::Throttled => WorkerErrorCode::Throttle,
            WorkerOutcome::Malformed => WorkerErrorCode::Malformed,
            WorkerOutcome::Killed => WorkerErrorCode::Killed,
        };
    }

    #[instrument(skip(self, clock), fields(worker_no = self.worker_no))]
    async fn visit_body(&self, point: Point, clock: &dyn Clock) -> Result<WorkerOutcome, UpstreamError> {
        let jittered = {
            let mut rng = rand::thread_rng();
            jitter_degrees(point, 1e-5, 1.0, &mut rng)
        };

        let cell_ids = {
            let runtime = self.runtime.clone();
            let p = jittered;
            tokio::task::spawn_blocking(move || runtime.cell_ids_for(p, || derive_cell_ids(p)))
                .await
                .expect("cell-id computation task panicked")
        };

        let response = {
            let upstream = self.upstream.lock().await;
            upstream.get_map_objects(jittered.lat, jittered.lon, &cell_ids).await?
        };

        if response.has_captcha() {
            return Ok(WorkerOutcome::Captcha { challenge_url: response.challenge_url.clone().unwrap_or_default() });
        }
        if response.is_account_banned() {
            return Ok(WorkerOutcome::Banned);
        }

        let mut encounters_seen = 0usize;
        for cell in &response.map_cells {
            for wild in &cell.wild_pokemons {
                encounters_seen += 1;
                let is_long_lived = !(0..=3_600_000).contains(&wild.time_till_hidden_ms);
                let time_till_hidden_s = if is_long_lived {
                    LONG_SPAWN_SENTINEL_SECS
                } else {
                    wild.time_till_hidden_ms / 1000
                };
                let sighting = Sighting {
                    encounter_id: wild.encounter_id.clone(),
                    species_id: wild.species_id,
                    spawn_id: wild.spawn_id.clone(),
                    expire_timestamp: clock.epoch_seconds() + time_till_hidden_s,
                    lat: wild.lat,
                    lon: wild.lon,
                };

                let item = if is_long_lived {
                    PipelineItem::LongSpawn(sighting.clone())
                } else {
                    PipelineItem::Sighting(sighting.clone())
                };
                let _ = self.pipeline.send(item).await;

                if self.notify_enabled
                    && !matches!(self.encounter_mode, EncounterMode::None)
                    && self.notify_ids.contains(&wild.species_id)
                {
                    self.notifier
                        .notify(&sighting.encounter_id, wild.species_id, wild.lat, wild.lon, time_till_hidden_s)
                        .await;
                }
            }

            for fort in &cell.forts {
                if !fort.enabled {
                    continue;
                }
                let is_pokestop = fort.fort_type == 1;
                if is_pokestop {
                    if !self.spin_pokestops || !self.spin_cooldown_elapsed(clock).await {
                        continue;
                    }
                }
                let landmark = Landmark {
                    external_id: fort.id.clone(),
                    lat: fort.lat,
                    lon: fort.lon,
                    team: if is_pokestop { None } else { fort.team },
                    prestige: if is_pokestop { None } else { fort.prestige },
                    guard_species_id: if is_pokestop { None } else { fort.guard_species_id },
                    last_modified: fort.last_modified_ms / 1000,
                };
                let _ = self.pipeline.send(PipelineItem::Fort(landmark)).await;
            }
        }

        self.total_seen.fetch_add(encounters_seen as u64, Ordering::Relaxed);
        self.visits.fetch_add(1, Ordering::Relaxed);

        if encounters_seen == 0 {
            let empty_count = self.empty_visits.fetch_add(1, Ordering::SeqCst) + 1;
            if empty_count > MAX_CONSECUTIVE_EMPTY_VISITS {
                info!("worker {} eligible for swap after {} empty visits", self.worker_no, empty_count);
            }
        } else {
            self.empty_visits.store(0, Ordering::SeqCst);
        }

        *self.last_visit.lock().await = Some(LastVisit { point: jittered, at_monotonic: clock.monotonic() });

        Ok(WorkerOutcome::Visited { encounters_seen })
    }

    pub fn should_swap_for_empty_visits(&self) -> bool {
        self.empty_visits.load(Ordering::SeqCst) > MAX_CONSECUTIVE_EMPTY_VISITS
    }

    pub async fn error_code(&self) -> WorkerErrorCode {
        *self.error_code.lock().await
    }

    /// Polls the sidecar for whether the pending challenge has been
    /// cleared by the out-of-process solver. The solver itself (and the
    /// token it ultimately produces) is an external collaborator out of
    /// scope here; once the sidecar reports the challenge gone, this
    /// hands whatever it was given back as the verification token.
    pub async fn recheck_captcha(&self) -> bool {
        if *self.error_code.lock().await != WorkerErrorCode::Captcha {
            return false;
        }
        let status = {
            let upstream = self.upstream.lock().await;
            upstream.check_challenge().await
        };
        let still_pending = match status {
            Ok(status) => status.challenge_url.is_some(),
            Err(_) => true,
        };
        if still_pending {
            return false;
        }
        if let Some(token) = self.pending_challenge.lock().await.take() {
            let upstream = self.upstream.lock().await;
            let _ = upstream.verify_challenge(&token).await;
        }
        *self.error_code.lock().await = WorkerErrorCode::Ok;
        true
    }

    pub fn visits_count(&self) -> u64 {
        self.visits.load(Ordering::Relaxed)
    }

    pub fn total_seen_count(&self) -> u64 {
        self.total_seen.load(Ordering::Relaxed)
    }

    /// Exchanges the bound account with a fresh one. The caller
    /// (scheduler) is responsible for returning the replaced account to
    /// the appropriate pool.
    pub async fn swap_account(&self, reason: &str, replacement: Account) -> Account {
        info!("worker {} swapping account: {reason}", self.worker_no);
        *self.error_code.lock().await = WorkerErrorCode::Swapping;
        let mut guard = self.account.lock().await;
        self.empty_visits.store(0, Ordering::SeqCst);
        std::mem::replace(&mut *guard, replacement)
    }

    /// Ends the post-swap cool-down: clears the `Swapping` status and
    /// frees the worker for ordinary dispatch again.
    pub async fn clear_swap_cooldown(&self) {
        let mut code = self.error_code.lock().await;
        if *code == WorkerErrorCode::Swapping {
            *code = WorkerErrorCode::Ok;
        }
        drop(code);
        self.release_busy();
    }

    pub async fn kill(&self) {
        *self.error_code.lock().await = WorkerErrorCode::Killed;
    }

    pub async fn account_snapshot(&self) -> Account {
        self.account.lock().await.clone()
    }
}

fn derive_cell_ids(point: Point) -> Vec<i64> {
    let (lat_key, lon_key) = point.rounded_key();
    (0..9)
        .map(|offset| lat_key.wrapping_mul(1_000_003).wrapping_add(lon_key).wrapping_add(offset))
        .collect()
}

fn mask_username(username: &str) -> String {
    if username.len() <= 2 {
        "**".to_string()
    } else {
        format!("{}***{}", &username[..1], &username[username.len() - 1..])
    }
}
