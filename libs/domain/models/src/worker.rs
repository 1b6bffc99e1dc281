use serde::{Deserialize, Serialize};

/// Single-letter error codes mirrored in the status display, matching
/// the visit state machine's side branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerErrorCode {
    /// Healthy, idle or mid-visit with no distress.
    Ok,
    /// `C` — captcha challenge pending.
    Captcha,
    /// `B` — explicit account ban (status code 3).
    Banned,
    /// `F` — access forbidden / IP ban.
    IpBanned,
    /// `L` — bad credentials.
    BadLogin,
    /// `T` — throttled by upstream.
    Throttle,
    /// `M` — malformed response from upstream.
    Malformed,
    /// `S` — mid account swap.
    Swapping,
    /// `K` — killed, will not take further work.
    Killed,
}

impl WorkerErrorCode {
    pub fn letter(self) -> char {
        match self {
            WorkerErrorCode::Ok => '.',
            WorkerErrorCode::Captcha => 'C',
            WorkerErrorCode::Banned => 'B',
            WorkerErrorCode::IpBanned => 'F',
            WorkerErrorCode::BadLogin => 'L',
            WorkerErrorCode::Throttle => 'T',
            WorkerErrorCode::Malformed => 'M',
            WorkerErrorCode::Swapping => 'S',
            WorkerErrorCode::Killed => 'K',
        }
    }

    /// Statuses worth surfacing prominently in the status line, as
    /// opposed to ordinary idle/visiting churn.
    pub fn is_bad_status(self) -> bool {
        !matches!(self, WorkerErrorCode::Ok)
    }
}

/// A read-only snapshot of one worker's state, used by the status
/// renderer and the viewer channel. Never mutated in place; the live
/// worker produces a fresh one on each sampling tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub worker_no: usize,
    pub username_masked: String,
    pub error_code: WorkerErrorCode,
    pub last_lat: f64,
    pub last_lon: f64,
    pub total_seen: u64,
    pub visits: u64,
    pub speed_mph: f64,
    pub empty_visit_count: u32,
}
