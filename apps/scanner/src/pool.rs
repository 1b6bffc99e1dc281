//! Account and proxy pools. Only the scheduler (and workers through
//! scheduler-mediated paths) enqueue or dequeue here, so a plain
//! mutex-guarded `VecDeque` is enough — no lock-free structure needed.

use geoscan_domain_models::{Account, Proxy};
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct AccountPool {
    ready: Mutex<VecDeque<Account>>,
    captcha: Mutex<VecDeque<Account>>,
}

impl AccountPool {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            ready: Mutex::new(VecDeque::from(accounts)),
            captcha: Mutex::new(VecDeque::new()),
        }
    }

    pub fn take_ready(&self) -> Option<Account> {
        self.ready.lock().expect("pool lock poisoned").pop_front()
    }

    /// Pushed to the tail: the replaced account goes back of the line,
    /// not the front, so every account gets a turn.
    pub fn push_ready(&self, account: Account) {
        self.ready.lock().expect("pool lock poisoned").push_back(account);
    }

    pub fn push_captcha(&self, account: Account) {
        self.captcha.lock().expect("pool lock poisoned").push_back(account);
    }

    pub fn pop_resolved_captcha(&self, username: &str) -> Option<Account> {
        let mut guard = self.captcha.lock().expect("pool lock poisoned");
        let position = guard.iter().position(|a| a.username == username)?;
        guard.remove(position)
    }

    pub fn captcha_queue_size(&self) -> usize {
        self.captcha.lock().expect("pool lock poisoned").len()
    }

    pub fn ready_queue_size(&self) -> usize {
        self.ready.lock().expect("pool lock poisoned").len()
    }
}

pub struct ProxyPool {
    proxies: Mutex<Vec<Proxy>>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<Proxy>) -> Self {
        Self { proxies: Mutex::new(proxies) }
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.lock().expect("pool lock poisoned").is_empty()
    }

    /// Hands out the next proxy round-robin. Returns `None` when no
    /// proxies are configured, in which case workers connect directly.
    pub fn next(&self) -> Option<Proxy> {
        let mut guard = self.proxies.lock().expect("pool lock poisoned");
        let proxy = guard.pop()?;
        guard.insert(0, proxy.clone());
        Some(proxy)
    }

    pub fn record_failure(&self, url: &str) {
        let mut guard = self.proxies.lock().expect("pool lock poisoned");
        if let Some(p) = guard.iter_mut().find(|p| p.url == url) {
            p.record_empty_visit();
        }
    }

    pub fn record_success(&self, url: &str) {
        let mut guard = self.proxies.lock().expect("pool lock poisoned");
        if let Some(p) = guard.iter_mut().find(|p| p.url == url) {
            p.record_successful_visit();
        }
    }

    pub fn record_latency(&self, url: &str, seconds: f64) {
        let mut guard = self.proxies.lock().expect("pool lock poisoned");
        if let Some(p) = guard.iter_mut().find(|p| p.url == url) {
            p.record_latency_seconds(seconds);
        }
    }

    /// Rotates `current`'s circuit when its health justifies it (or
    /// `force` overrides that check, as for an explicit IP ban) and its
    /// per-proxy rate limit allows it. Returns the proxy the worker
    /// should switch to, if rotation happened.
    pub fn maybe_rotate(&self, current: &str, force: bool, now_epoch_seconds: i64) -> Option<Proxy> {
        let mut guard = self.proxies.lock().expect("pool lock poisoned");
        let idx = guard.iter().position(|p| p.url == current)?;
        if !(force || guard[idx].should_rotate()) || !guard[idx].can_rotate_at(now_epoch_seconds) {
            return None;
        }
        guard[idx].mark_rotated(now_epoch_seconds);
        if guard.len() > 1 {
            let rotated = guard.remove(idx);
            let next = guard[0].clone();
            guard.push(rotated);
            Some(next)
        } else {
            Some(guard[idx].clone())
        }
    }
}
