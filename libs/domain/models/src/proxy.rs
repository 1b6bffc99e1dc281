use std::collections::VecDeque;

const LATENCY_WINDOW_CAPACITY: usize = 30;
const LATENCY_ROTATION_THRESHOLD_SECS: f64 = 10.0;
const LATENCY_ROTATION_MIN_SAMPLES: usize = 10;

/// One proxy endpoint and the rolling health signal used to decide
/// whether its circuit needs rotating.
#[derive(Debug, Clone)]
pub struct Proxy {
    pub url: String,
    pub last_rotated_at: Option<i64>,
    pub consecutive_failure_count: u32,
    latency_window: VecDeque<f64>,
}

impl Proxy {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_rotated_at: None,
            consecutive_failure_count: 0,
            latency_window: VecDeque::with_capacity(LATENCY_WINDOW_CAPACITY),
        }
    }

    pub fn record_latency_seconds(&mut self, seconds: f64) {
        if self.latency_window.len() == LATENCY_WINDOW_CAPACITY {
            self.latency_window.pop_front();
        }
        self.latency_window.push_back(seconds);
    }

    pub fn record_empty_visit(&mut self) {
        self.consecutive_failure_count += 1;
    }

    pub fn record_successful_visit(&mut self) {
        self.consecutive_failure_count = 0;
    }

    fn mean_latency(&self) -> Option<f64> {
        if self.latency_window.is_empty() {
            return None;
        }
        Some(self.latency_window.iter().sum::<f64>() / self.latency_window.len() as f64)
    }

    /// True if this proxy's health justifies rotating to a new circuit:
    /// sustained high latency or a long run of empty visits. A caller
    /// wanting the explicit-ban trigger should rotate unconditionally
    /// instead of consulting this.
    pub fn should_rotate(&self) -> bool {
        if self.consecutive_failure_count > 20 {
            return true;
        }
        match self.mean_latency() {
            Some(mean) if self.latency_window.len() >= LATENCY_ROTATION_MIN_SAMPLES => {
                mean > LATENCY_ROTATION_THRESHOLD_SECS
            }
            _ => false,
        }
    }

    /// Rotation is rate-limited to at most once per 180 s per proxy.
    pub fn can_rotate_at(&self, now_epoch_seconds: i64) -> bool {
        match self.last_rotated_at {
            None => true,
            Some(last) => now_epoch_seconds - last >= 180,
        }
    }

    pub fn mark_rotated(&mut self, now_epoch_seconds: i64) {
        self.last_rotated_at = Some(now_epoch_seconds);
        self.consecutive_failure_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_after_twenty_consecutive_empty_visits() {
        let mut p = Proxy::new("http://proxy.local:8080");
        for _ in 0..21 {
            p.record_empty_visit();
        }
        assert!(p.should_rotate());
    }

    #[test]
    fn rate_limited_to_once_per_180_seconds() {
        let mut p = Proxy::new("http://proxy.local:8080");
        assert!(p.can_rotate_at(1000));
        p.mark_rotated(1000);
        assert!(!p.can_rotate_at(1100));
        assert!(p.can_rotate_at(1180));
    }
}
