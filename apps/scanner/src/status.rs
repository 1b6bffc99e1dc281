//! Status line rendering, kept as a pure function from a snapshot of
//! worker/scheduler fields to a string — the supervisor samples it on
//! a tick, it has no state of its own.

use geoscan_domain_models::WorkerSnapshot;

pub struct StatusSnapshot {
    pub workers: Vec<WorkerSnapshot>,
    pub skipped: u64,
    pub redundant: u64,
    pub dispatched: u64,
    pub captcha_queue_size: usize,
    pub extra_queue_size: usize,
    pub paused: bool,
}

pub fn render(snapshot: &StatusSnapshot) -> String {
    let codes: String = snapshot.workers.iter().map(|w| w.error_code.letter()).collect();
    let total_seen: u64 = snapshot.workers.iter().map(|w| w.total_seen).sum();

    let pause_marker = if snapshot.paused { " [PAUSED]" } else { "" };

    format!(
        "[{codes}] seen={total_seen} dispatched={} skipped={} redundant={} captcha_q={} extra_q={}{pause_marker}",
        snapshot.dispatched, snapshot.skipped, snapshot.redundant, snapshot.captcha_queue_size, snapshot.extra_queue_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscan_domain_models::WorkerErrorCode;

    fn worker(code: WorkerErrorCode) -> WorkerSnapshot {
        WorkerSnapshot {
            worker_no: 0,
            username_masked: "a***b".into(),
            error_code: code,
            last_lat: 0.0,
            last_lon: 0.0,
            total_seen: 3,
            visits: 1,
            speed_mph: 2.0,
            empty_visit_count: 0,
        }
    }

    #[test]
    fn renders_one_letter_per_worker_in_order() {
        let snapshot = StatusSnapshot {
            workers: vec![worker(WorkerErrorCode::Ok), worker(WorkerErrorCode::Captcha)],
            skipped: 0,
            redundant: 0,
            dispatched: 2,
            captcha_queue_size: 1,
            extra_queue_size: 0,
            paused: false,
        };
        let line = render(&snapshot);
        assert!(line.starts_with("[.C]"));
    }

    #[test]
    fn marks_paused_state() {
        let snapshot = StatusSnapshot {
            workers: vec![],
            skipped: 0,
            redundant: 0,
            dispatched: 0,
            captcha_queue_size: 0,
            extra_queue_size: 0,
            paused: true,
        };
        assert!(render(&snapshot).ends_with("[PAUSED]"));
    }
}
