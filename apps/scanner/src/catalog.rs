//! The spawn catalog: the ordered set of known reactivation points for
//! the current hour, plus a side channel of schedule-less "mystery"
//! points used to soak up idle worker capacity.

use geoscan_core_geo::Point;
use geoscan_domain_models::Spawn;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{info, instrument, warn};

pub struct SpawnCatalog {
    spawns: Vec<Spawn>,
    mysteries: VecDeque<Point>,
}

impl SpawnCatalog {
    /// Prefers an on-disk snapshot when present and permitted by
    /// `include_pickle`; otherwise builds from scratch with whatever
    /// spawns the caller already knows about. Keeps entries in
    /// ascending offset-within-hour order.
    #[instrument(skip(snapshot_path, fallback))]
    pub async fn load(snapshot_path: &Path, include_pickle: bool, fallback: Vec<Spawn>) -> Self {
        let mut spawns = if include_pickle {
            match crate::snapshot::load_spawn_snapshot(snapshot_path).await {
                Ok(Some(loaded)) => {
                    info!("loaded {} spawns from snapshot", loaded.len());
                    loaded
                }
                Ok(None) => fallback,
                Err(e) => {
                    warn!("spawn snapshot unreadable, starting fresh: {e}");
                    fallback
                }
            }
        } else {
            fallback
        };

        spawns.sort_by_key(|s| s.offset_in_hour_seconds);
        Self { spawns, mysteries: VecDeque::new() }
    }

    pub fn iter_in_offset_order(&self) -> impl Iterator<Item = &Spawn> {
        self.spawns.iter()
    }

    pub fn spawns_snapshot(&self) -> Vec<Spawn> {
        self.spawns.clone()
    }

    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }

    /// True once the within-hour clock has advanced past every known
    /// offset, meaning the launch loop should roll the hour baseline
    /// forward by 3600 and start the sweep over.
    pub fn after_last(&self, within_hour_seconds: i64) -> bool {
        match self.spawns.iter().map(|s| s.offset_in_hour_seconds).max() {
            Some(max_offset) => within_hour_seconds > max_offset,
            None => true,
        }
    }

    /// The spawn whose offset is closest to, but not after, the current
    /// within-hour time — used to resume mid-hour without rescanning
    /// spawns that have already fired this hour.
    pub fn get_start_point(&self, within_hour_seconds: i64) -> Option<&Spawn> {
        let mut best: Option<(&Spawn, i64)> = None;
        for spawn in &self.spawns {
            if spawn.offset_in_hour_seconds > within_hour_seconds {
                continue;
            }
            let diff = within_hour_seconds - spawn.offset_in_hour_seconds;
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((spawn, diff)),
            }
            if diff < 3 {
                break;
            }
        }
        best.map(|(s, _)| s)
    }

    pub fn push_mystery(&mut self, point: Point) {
        self.mysteries.push_back(point);
    }

    pub fn mysteries_count(&self) -> usize {
        self.mysteries.len()
    }

    /// Drains one mystery point, if any remain.
    pub fn next_mystery(&mut self) -> Option<Point> {
        self.mysteries.pop_front()
    }
}
