//! Single background consumer draining a producer queue of tagged
//! persistence items. Workers never talk to the database directly;
//! they push onto this queue and move on to the next visit.

use crate::cache::{LongspawnCache, SightingCache};
use geoscan_domain_models::PipelineItem;
use geoscan_infra_db::{DbError, FortRepository, LongSpawnRepository, SightingRepository};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

pub struct PersistencePipeline {
    sender: mpsc::Sender<PipelineItem>,
    pub sightings_stored: Arc<AtomicU64>,
}

impl PersistencePipeline {
    /// Spawns the consumer task and returns a handle holding the
    /// producer side. `sighting_cache`/`longspawn_cache` are shared with
    /// the scheduler so its periodic `clean_expired` sweep and this
    /// consumer's dedup checks see the same state.
    pub fn spawn(
        sighting_repository: SightingRepository,
        longspawn_repository: LongSpawnRepository,
        fort_repository: FortRepository,
        sighting_cache: Arc<SightingCache>,
        longspawn_cache: Arc<LongspawnCache>,
        queue_capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let stored_counter = Arc::new(AtomicU64::new(0));

        tokio::spawn(Self::run(
            receiver,
            sighting_repository,
            longspawn_repository,
            fort_repository,
            sighting_cache,
            longspawn_cache,
            stored_counter.clone(),
        ));

        Self { sender, sightings_stored: stored_counter }
    }

    pub fn handle(&self) -> mpsc::Sender<PipelineItem> {
        self.sender.clone()
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(PipelineItem::Kill).await;
    }

    #[instrument(skip_all)]
    async fn run(
        mut receiver: mpsc::Receiver<PipelineItem>,
        sighting_repository: SightingRepository,
        longspawn_repository: LongSpawnRepository,
        fort_repository: FortRepository,
        sighting_cache: Arc<SightingCache>,
        longspawn_cache: Arc<LongspawnCache>,
        stored_counter: Arc<AtomicU64>,
    ) {
        while let Some(item) = receiver.recv().await {
            match item {
                PipelineItem::Sighting(sighting) => {
                    let key = sighting.key();
                    if sighting_cache.contains(&key) {
                        continue;
                    }
                    match sighting_repository.insert_if_new(&sighting).await {
                        Ok(true) => {
                            sighting_cache.insert(key, sighting.expire_timestamp);
                            stored_counter.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok(false) => {
                            info!("duplicate sighting suppressed at db layer: {}", sighting.encounter_id);
                            sighting_cache.insert(key, sighting.expire_timestamp);
                        }
                        Err(DbError::Query(e)) => {
                            info!("transient db error on sighting insert, continuing: {e}");
                        }
                        Err(other) => {
                            error!("sighting insert failed: {other}");
                        }
                    }
                }
                PipelineItem::LongSpawn(sighting) => {
                    let key = sighting.key();
                    if let Err(e) = longspawn_repository.upsert(&sighting).await {
                        error!("longspawn upsert failed: {e}");
                    } else {
                        longspawn_cache.insert(key, sighting.expire_timestamp);
                    }
                }
                PipelineItem::Fort(landmark) => {
                    if let Err(e) = fort_repository.upsert_if_newer(&landmark).await {
                        error!("fort upsert failed: {e}");
                    }
                }
                PipelineItem::Kill => {
                    info!("pipeline draining remaining items before shutdown");
                    while let Ok(remaining) = receiver.try_recv() {
                        if matches!(remaining, PipelineItem::Kill) {
                            continue;
                        }
                        // Best-effort drain; a shutting-down process favors
                        // exiting promptly over exhaustively flushing the
                        // final few items.
                        if let PipelineItem::Sighting(s) = remaining {
                            let _ = sighting_repository.insert_if_new(&s).await;
                        }
                    }
                    break;
                }
            }
        }
    }
}
