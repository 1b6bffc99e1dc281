//! Composition root: wires the database, the worker pool, the
//! persistence pipeline and the viewer channel together, then hands
//! control to the scheduler's two daemon loops plus the HTTP listener.

use crate::bootstrap::Bootstrap;
use crate::cache::{LongspawnCache, SightingCache};
use crate::catalog::SpawnCatalog;
use crate::config::ScannerConfig;
use crate::errors::ScanError;
use crate::notifier::Notifier;
use crate::pipeline::PersistencePipeline;
use crate::pool::{AccountPool, ProxyPool};
use crate::routes::{viewer_router, ViewerState};
use crate::runtime::RuntimeContext;
use crate::scheduler::Scheduler;
use crate::snapshot;
use crate::worker::Worker;
use geoscan_core_geo::{GridSpec, Point};
use geoscan_infra_db::{DbClient, FortRepository, LongSpawnRepository, SightingRepository, SystemStateRepository};
use geoscan_infra_upstream::HttpUpstreamClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ScannerKernel {
    scheduler: Arc<Scheduler>,
    runtime: Arc<RuntimeContext>,
    pipeline: PersistencePipeline,
    viewer_state: ViewerState,
    viewer_bind_addr: String,
    grid: GridSpec,
    run_bootstrap: bool,
    bootstrap_density: usize,
    spawn_snapshot_path: PathBuf,
    accounts_snapshot_path: PathBuf,
}

impl ScannerKernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: ScannerConfig) -> Result<Self, ScanError> {
        let db = DbClient::connect(&config.database_url, config.database_access_token.clone()).await?;

        let sighting_repository = SightingRepository::new(db.clone());
        let longspawn_repository = LongSpawnRepository::new(db.clone());
        let fort_repository = FortRepository::new(db.clone());
        let system_state_repository = SystemStateRepository::new(db.clone());

        let map_start = Point::flat(config.map_start_lat, config.map_start_lon);
        let map_end = Point::flat(config.map_end_lat, config.map_end_lon);
        let grid = GridSpec::new(config.grid_rows, config.grid_cols, map_start, map_end);

        let runtime = RuntimeContext::new(config.simultaneous_logins);

        let spawn_snapshot_path = PathBuf::from(&config.spawn_snapshot_path);
        let accounts_snapshot_path = PathBuf::from(&config.accounts_snapshot_path);

        let catalog = SpawnCatalog::load(&spawn_snapshot_path, !config.no_pickle, Vec::new()).await;

        let sighting_cache = Arc::new(SightingCache::new());
        let longspawn_cache = Arc::new(LongspawnCache::new());

        let sightings_capacity = (config.grid_rows * config.grid_cols).max(1) * 64;
        let pipeline = PersistencePipeline::spawn(
            sighting_repository,
            longspawn_repository,
            fort_repository,
            sighting_cache.clone(),
            longspawn_cache.clone(),
            sightings_capacity,
        );

        let mut accounts = if !config.no_pickle {
            match snapshot::load_accounts_snapshot(&accounts_snapshot_path).await {
                Ok(Some(loaded)) if !loaded.is_empty() => loaded,
                _ => config.parsed_accounts(),
            }
        } else {
            config.parsed_accounts()
        };
        let proxy_pool = Arc::new(ProxyPool::new(config.parsed_proxies()));
        let notifier = Arc::new(Notifier::new(config.desired_frequency()));

        // One worker per grid cell, per the bootstrap coverage law; any
        // accounts beyond that count seed the ready pool as spares for
        // the swap subsystem instead of each getting a permanent worker.
        let worker_count = grid.cell_count();
        if accounts.len() < worker_count {
            return Err(ScanError::Configuration(format!(
                "need at least {worker_count} accounts to cover a {worker_count}-cell grid, found {}",
                accounts.len()
            )));
        }
        let spare_accounts = accounts.split_off(worker_count);

        let mut workers = Vec::with_capacity(worker_count);
        for (worker_no, account) in accounts.into_iter().enumerate() {
            let proxy = proxy_pool.next();
            let upstream = Box::new(HttpUpstreamClient::new(config.upstream_base_url.clone()));
            let worker = Arc::new(Worker::new(
                worker_no,
                account,
                proxy,
                upstream,
                runtime.clone(),
                proxy_pool.clone(),
                pipeline.handle(),
                notifier.clone(),
                &config,
            ));
            workers.push(worker);
        }

        let account_pool = Arc::new(AccountPool::new(spare_accounts));

        let viewer_bind_addr = config.viewer_bind_addr.clone();
        let run_bootstrap = config.bootstrap;
        let bootstrap_density = config.bootstrap_density_multiplier;
        let viewer_auth_key = config.viewer_auth_key.clone();

        let scheduler = Scheduler::new(
            workers,
            account_pool,
            sighting_cache,
            longspawn_cache,
            catalog,
            runtime.clone(),
            config,
            system_state_repository,
        );

        let viewer_state = ViewerState { scheduler: scheduler.clone(), runtime: runtime.clone(), auth_key: viewer_auth_key };

        Ok(Self {
            scheduler,
            runtime,
            pipeline,
            viewer_state,
            viewer_bind_addr,
            grid,
            run_bootstrap,
            bootstrap_density,
            spawn_snapshot_path,
            accounts_snapshot_path,
        })
    }

    pub fn runtime(&self) -> Arc<RuntimeContext> {
        self.runtime.clone()
    }

    /// Runs bootstrap (if configured), then the launch and supervisory
    /// loops alongside the viewer's HTTP listener, until the kill flag
    /// is observed. Snapshots are written on the way out.
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<(), ScanError> {
        if self.run_bootstrap {
            info!("running bootstrap coverage sweep before regular scheduling");
            Bootstrap::stage_one(self.scheduler.clone(), self.grid).await;
            Bootstrap::stage_two(self.scheduler.clone(), self.grid, self.bootstrap_density).await;
        }

        let bind_addr: SocketAddr = self
            .viewer_bind_addr
            .parse()
            .map_err(|e| ScanError::Configuration(format!("invalid VIEWER_BIND_ADDR: {e}")))?;
        let router = viewer_router(self.viewer_state.clone());
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ScanError::Configuration(format!("failed to bind viewer channel: {e}")))?;
        info!("viewer channel listening on {bind_addr}");

        let runtime_for_server = self.runtime.clone();
        let server = tokio::spawn(async move {
            let serve = axum::serve(listener, router);
            tokio::select! {
                result = serve => {
                    if let Err(e) = result {
                        warn!("viewer channel server exited: {e}");
                    }
                }
                _ = wait_for_kill(runtime_for_server) => {}
            }
        });

        let launch = tokio::spawn(self.scheduler.clone().run_launch_loop());
        let supervisory = tokio::spawn(self.scheduler.clone().run_supervisory_loop());

        let _ = tokio::join!(launch, supervisory);
        server.abort();

        info!("draining persistence pipeline before exit");
        self.pipeline.shutdown().await;

        self.write_snapshots().await;

        Ok(())
    }

    async fn write_snapshots(&self) {
        let spawns: Vec<_> = self.scheduler.snapshot_spawns().await;
        if let Err(e) = snapshot::save_spawn_snapshot(&self.spawn_snapshot_path, &spawns).await {
            warn!("failed to write spawn snapshot: {e}");
        }

        let accounts = self.scheduler.snapshot_accounts().await;
        if let Err(e) = snapshot::save_accounts_snapshot(&self.accounts_snapshot_path, &accounts).await {
            warn!("failed to write accounts snapshot: {e}");
        }
    }
}

async fn wait_for_kill(runtime: Arc<RuntimeContext>) {
    while !runtime.is_killed() {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
