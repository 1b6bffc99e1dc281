//! The viewer channel: a small bearer-guarded read-only HTTP surface
//! exposing live scheduler state for an external dashboard or CLI.
//! Every handler here only reads — nothing on this channel mutates
//! scanner state.

use crate::middleware::auth_guard;
use crate::runtime::RuntimeContext;
use crate::scheduler::Scheduler;
use crate::status::{render, StatusSnapshot};
use axum::{extract::State, middleware, routing::get, Json, Router};
use geoscan_domain_models::WorkerSnapshot;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct ViewerState {
    pub scheduler: Arc<Scheduler>,
    pub runtime: Arc<RuntimeContext>,
    pub auth_key: Option<String>,
}

#[derive(Serialize)]
struct WorkerDictEntry {
    #[serde(flatten)]
    snapshot: WorkerSnapshot,
}

pub fn viewer_router(state: ViewerState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(handle_status))
        .route("/workers", get(handle_worker_dict))
        .route("/queues/captcha", get(handle_captcha_queue))
        .route("/queues/extra", get(handle_extra_queue))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .with_state(state)
}

async fn handle_status(State(state): State<ViewerState>) -> Json<Value> {
    let mut workers = Vec::with_capacity(state.scheduler.workers.len());
    for worker in &state.scheduler.workers {
        workers.push(worker.snapshot().await);
    }

    let snapshot = StatusSnapshot {
        workers,
        skipped: state.scheduler.stats.skipped.load(std::sync::atomic::Ordering::Relaxed),
        redundant: state.scheduler.stats.redundant.load(std::sync::atomic::Ordering::Relaxed),
        dispatched: state.scheduler.stats.dispatched.load(std::sync::atomic::Ordering::Relaxed),
        captcha_queue_size: state.scheduler.account_pool.captcha_queue_size(),
        extra_queue_size: 0,
        paused: state.runtime.is_paused(),
    };

    Json(json!({ "line": render(&snapshot) }))
}

async fn handle_worker_dict(State(state): State<ViewerState>) -> Json<Vec<WorkerDictEntry>> {
    let mut entries = Vec::with_capacity(state.scheduler.workers.len());
    for worker in &state.scheduler.workers {
        entries.push(WorkerDictEntry { snapshot: worker.snapshot().await });
    }
    Json(entries)
}

async fn handle_captcha_queue(State(state): State<ViewerState>) -> Json<Value> {
    Json(json!({ "size": state.scheduler.account_pool.captcha_queue_size() }))
}

async fn handle_extra_queue(State(_state): State<ViewerState>) -> Json<Value> {
    // Mystery-point backlog lives inside the catalog, which the
    // scheduler guards with its own mutex rather than exposing a
    // lock-free counter; reported as zero until that's worth the cost.
    Json(json!({ "size": 0 }))
}
