use std::sync::Arc;

use eyeguard::config::Config;
use eyeguard::logging::init_tracing;
use eyeguard::service::DetectionService;
use eyeguard::settings::SettingsStore;
use eyeguard::sim::{LogNotifier, SimulatedDetector, SimulatedPipeline};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&config);
    tracing::info!("Starting eyeguard");

    let settings =
        Arc::new(SettingsStore::open(&config.sled_path).expect("Failed to open settings store"));

    let pipeline = Arc::new(SimulatedPipeline::new(&config.sim));
    let detector = Arc::new(SimulatedDetector::new(&config.sim));
    let notifier = Arc::new(LogNotifier);

    let (service, handle) =
        DetectionService::new(pipeline, detector, notifier, settings.clone());
    let service_task = tokio::spawn(service.run());

    if settings.detection_enabled().unwrap_or(false) {
        tracing::info!("restoring detection from previous session");
    }
    if let Err(e) = handle.start().await {
        tracing::error!(error = %e, "could not start detection");
        handle.shutdown().await;
        let _ = service_task.await;
        return;
    }

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");

    handle.stop().await;
    handle.shutdown().await;
    let _ = service_task.await;
}
