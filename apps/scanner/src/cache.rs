//! In-memory dedup caches sitting in front of the persistence pipeline.
//! Each entry records its own expiry; `clean_expired` is driven by the
//! scheduler's supervisory loop rather than a background timer of its
//! own, keeping the cache a passive data structure.

use geoscan_domain_models::SightingKey;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

struct Inner {
    entries: HashMap<SightingKey, i64>,
    observed_spawns_this_hour: HashSet<String>,
}

/// Dedup cache for short-lived sightings, plus the set of spawn IDs
/// already visited this hour (used by the scheduler to mark redundant
/// re-visits without a DB round-trip).
pub struct SightingCache {
    inner: Mutex<Inner>,
}

impl SightingCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { entries: HashMap::new(), observed_spawns_this_hour: HashSet::new() }),
        }
    }

    pub fn contains(&self, key: &SightingKey) -> bool {
        self.inner.lock().expect("cache lock poisoned").entries.contains_key(key)
    }

    pub fn insert(&self, key: SightingKey, expiry_epoch_seconds: i64) {
        self.inner.lock().expect("cache lock poisoned").entries.insert(key, expiry_epoch_seconds);
    }

    pub fn clean_expired(&self, now_epoch_seconds: i64) -> usize {
        let mut guard = self.inner.lock().expect("cache lock poisoned");
        let before = guard.entries.len();
        guard.entries.retain(|_, expiry| *expiry >= now_epoch_seconds);
        before - guard.entries.len()
    }

    pub fn mark_spawn_observed(&self, spawn_id: &str) {
        self.inner.lock().expect("cache lock poisoned").observed_spawns_this_hour.insert(spawn_id.to_string());
    }

    pub fn spawn_observed(&self, spawn_id: &str) -> bool {
        self.inner.lock().expect("cache lock poisoned").observed_spawns_this_hour.contains(spawn_id)
    }

    /// Called on hour rollover: the per-hour observed-spawns set does
    /// not carry meaning across hour boundaries.
    pub fn clear_observed_spawns(&self) {
        self.inner.lock().expect("cache lock poisoned").observed_spawns_this_hour.clear();
    }
}

impl Default for SightingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedup cache for extended-lifetime ("long spawn") observations.
/// Keyed the same way as `SightingCache` — the distinction between the
/// two caches is which pipeline branch feeds them, not their shape.
pub struct LongspawnCache {
    entries: Mutex<HashMap<SightingKey, i64>>,
}

impl LongspawnCache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    pub fn contains(&self, key: &SightingKey) -> bool {
        self.entries.lock().expect("cache lock poisoned").contains_key(key)
    }

    pub fn insert(&self, key: SightingKey, expiry_epoch_seconds: i64) {
        self.entries.lock().expect("cache lock poisoned").insert(key, expiry_epoch_seconds);
    }

    pub fn clean_expired(&self, now_epoch_seconds: i64) -> usize {
        let mut guard = self.entries.lock().expect("cache lock poisoned");
        let before = guard.len();
        guard.retain(|_, expiry| *expiry >= now_epoch_seconds);
        before - guard.len()
    }
}

impl Default for LongspawnCache {
    fn default() -> Self {
        Self::new()
    }
}
