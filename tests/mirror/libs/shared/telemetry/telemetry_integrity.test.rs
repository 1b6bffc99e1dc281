use geoscan_shared_telemetry::init_tracing;

#[test]
fn init_tracing_does_not_panic_on_first_call() {
    init_tracing("telemetry_integrity_test");
    tracing::info!("telemetry smoke line");
}
