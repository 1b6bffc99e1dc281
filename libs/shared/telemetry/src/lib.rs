//! Structured logging bootstrap shared by every binary in the workspace.
//!
//! Development builds get a compact, colorized writer; release builds get
//! flattened JSON lines suitable for ingestion by a log pipeline. A global
//! panic hook mirrors panics from any spawned task into the same trace
//! output so a crash in a background daemon is never silent.

use std::panic;
use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber and panic hook for `service_name`.
///
/// Honors `RUST_LOG` if set; otherwise defaults to `debug` for `service_name`'s
/// own target and `warn`/`error` for noisy infrastructure crates.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,libsql=warn",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    let service_name = service_name.to_string();
    info!("telemetry initialized for {service_name}");

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<no panic message>");

        error!(target: "panic", service = %service_name, at = %location, "thread panicked: {payload}");
    }));
}
