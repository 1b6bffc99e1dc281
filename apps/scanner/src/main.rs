use clap::Parser;
use geoscan_scanner::prelude::*;
use geoscan_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ScannerConfig::parse();
    config.apply_log_level();
    init_tracing("geoscan_scanner");

    if let Err(reason) = config.validate() {
        error!("invalid configuration: {reason}");
        std::process::exit(2);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.network_threads())
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let kernel = match ScannerKernel::ignite(config).await {
            Ok(k) => k,
            Err(e) => {
                error!("failed to start scanner: {e}");
                std::process::exit(1);
            }
        };

        let kill_switch = kernel.runtime();
        ctrlc::set_handler(move || {
            info!("shutdown signal received, draining in-flight work");
            kill_switch.kill();
        })
        .expect("failed to install ctrl-c handler");

        if let Err(e) = kernel.run().await {
            error!("scanner exited with an error: {e}");
            std::process::exit(1);
        }

        info!("scanner shut down cleanly");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
