//! Local REST API used by the presentation shell.
//!
//! Provides HTTP endpoints for:
//! - Capture device discovery
//! - Stream start/stop
//! - Live mix adjustment
//! - Stream status

pub mod error;
pub mod routes;

use crate::config::ApiConfig;
use crate::devices::DeviceEnumerator;
use crate::stream::StreamSupervisor;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

pub use routes::stream::{AdjustRequest, StartRequest};

pub struct ApiServer {
    bind_addr: String,
    supervisor: Arc<StreamSupervisor>,
    enumerator: Arc<dyn DeviceEnumerator>,
}

impl ApiServer {
    pub fn new(
        config: &ApiConfig,
        supervisor: Arc<StreamSupervisor>,
        enumerator: Arc<dyn DeviceEnumerator>,
    ) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            supervisor,
            enumerator,
        }
    }

    pub fn router(&self) -> Router {
        router(Arc::clone(&self.supervisor), Arc::clone(&self.enumerator))
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", self.bind_addr))?;

        info!("API server listening on http://{}", self.bind_addr);
        info!("Endpoints:");
        info!("  GET  /              - Service info");
        info!("  GET  /devices       - List audio capture devices");
        info!("  POST /start         - Start streaming");
        info!("  POST /stop          - Stop streaming");
        info!("  POST /adjust        - Set mic/system mix weights");
        info!("  GET  /status        - Get stream status");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

pub fn router(supervisor: Arc<StreamSupervisor>, enumerator: Arc<dyn DeviceEnumerator>) -> Router {
    Router::new()
        .route("/", get(status))
        .merge(routes::stream::router(supervisor))
        .nest("/devices", routes::devices::router(enumerator))
        .layer(ServiceBuilder::new())
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "mixcast",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
