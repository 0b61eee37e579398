use crate::api::ApiServer;
use crate::config::Config;
use crate::devices::{DeviceEnumerator, DshowDeviceEnumerator};
use crate::stream::StreamSupervisor;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting mixcast service");

    let supervisor = Arc::new(StreamSupervisor::new(config.encoder.clone()));
    let enumerator: Arc<dyn DeviceEnumerator> =
        Arc::new(DshowDeviceEnumerator::new(config.encoder.clone())?);

    if let Err(e) = config.encoder.resolve() {
        error!(
            "Encoder '{}' not found ({}); device listing and streaming will fail",
            config.encoder.command, e
        );
    }

    let api_server = ApiServer::new(&config.api, Arc::clone(&supervisor), enumerator);
    let result = api_server.serve(shutdown_signal()).await;

    info!("Shutting down, stopping any running stream");
    if let Err(e) = supervisor.shutdown().await {
        error!("Failed to stop stream during shutdown: {}", e);
    }

    result
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
