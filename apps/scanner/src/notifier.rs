//! Interface to the notification transport, which is an out-of-scope
//! external collaborator. What's in scope is the idempotency FIFO and
//! the self-tuning species-rank window built on top of it.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tracing::instrument;

const DEDUP_FIFO_CAPACITY: usize = 200;
const INTERVAL_WINDOW_CAPACITY: usize = 20;
const RANK_MIN: usize = 20;
const RANK_MAX: usize = 75;
const RANK_STEP: usize = 2;

struct Inner {
    seen_order: VecDeque<String>,
    seen_set: HashSet<String>,
    last_notification_monotonic: Option<std::time::Instant>,
    interval_window: VecDeque<f64>,
    eligible_rank: usize,
}

/// Self-tuning notification gate: narrows the eligible-species rank
/// window when notifications are arriving faster than desired, widens
/// it when they're too sparse.
pub struct Notifier {
    inner: Mutex<Inner>,
    desired_frequency_seconds: (f64, f64),
}

impl Notifier {
    pub fn new(desired_frequency_seconds: (f64, f64)) -> Self {
        Self {
            inner: Mutex::new(Inner {
                seen_order: VecDeque::with_capacity(DEDUP_FIFO_CAPACITY),
                seen_set: HashSet::new(),
                last_notification_monotonic: None,
                interval_window: VecDeque::with_capacity(INTERVAL_WINDOW_CAPACITY),
                eligible_rank: RANK_MAX,
            }),
            desired_frequency_seconds,
        }
    }

    /// Idempotent per `encounter_id` within the bounded FIFO window.
    /// Returns `(notified, explanation)`.
    #[instrument(skip(self), fields(encounter_id = %encounter_id))]
    pub async fn notify(&self, encounter_id: &str, species_id: u32, lat: f64, lon: f64, time_till_hidden_s: i64) -> (bool, String) {
        let mut guard = self.inner.lock().expect("notifier lock poisoned");

        if guard.seen_set.contains(encounter_id) {
            return (false, "already notified for this encounter".to_string());
        }

        if guard.seen_order.len() == DEDUP_FIFO_CAPACITY {
            if let Some(oldest) = guard.seen_order.pop_front() {
                guard.seen_set.remove(&oldest);
            }
        }
        guard.seen_order.push_back(encounter_id.to_string());
        guard.seen_set.insert(encounter_id.to_string());

        let now = std::time::Instant::now();
        if let Some(last) = guard.last_notification_monotonic {
            let interval = now.duration_since(last).as_secs_f64();
            if guard.interval_window.len() == INTERVAL_WINDOW_CAPACITY {
                guard.interval_window.pop_front();
            }
            guard.interval_window.push_back(interval);
            self.retune(&mut guard);
        }
        guard.last_notification_monotonic = Some(now);

        // The transport itself (push/webhook/IM bot) is out of scope;
        // the explanation is what this layer can attest to.
        (true, format!("species {species_id} at ({lat:.5},{lon:.5}), expires in {time_till_hidden_s}s"))
    }

    fn retune(&self, guard: &mut Inner) {
        if guard.interval_window.is_empty() {
            return;
        }
        let mean = guard.interval_window.iter().sum::<f64>() / guard.interval_window.len() as f64;
        let (low, high) = self.desired_frequency_seconds;
        if mean < low && guard.eligible_rank > RANK_MIN {
            guard.eligible_rank = guard.eligible_rank.saturating_sub(RANK_STEP).max(RANK_MIN);
        } else if mean > high && guard.eligible_rank < RANK_MAX {
            guard.eligible_rank = (guard.eligible_rank + RANK_STEP).min(RANK_MAX);
        }
    }

    pub fn eligible_rank(&self) -> usize {
        self.inner.lock().expect("notifier lock poisoned").eligible_rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_notification_for_same_encounter_is_suppressed() {
        let notifier = Notifier::new((5.0, 30.0));
        let (first, _) = notifier.notify("enc-1", 25, 0.1, 0.1, 300).await;
        let (second, explanation) = notifier.notify("enc-1", 25, 0.1, 0.1, 300).await;
        assert!(first);
        assert!(!second);
        assert!(explanation.contains("already notified"));
    }

    #[tokio::test]
    async fn fifo_eviction_allows_renotification_once_window_rotates() {
        let notifier = Notifier::new((5.0, 30.0));
        for i in 0..DEDUP_FIFO_CAPACITY {
            notifier.notify(&format!("enc-{i}"), 1, 0.0, 0.0, 60).await;
        }
        let (renotified, _) = notifier.notify("enc-0", 1, 0.0, 0.0, 60).await;
        assert!(renotified);
    }
}
