//! Stream control endpoints.
//!
//! Provides HTTP endpoints for:
//! - Starting a stream (POST /start)
//! - Stopping it (POST /stop)
//! - Re-balancing the mic/system mix (POST /adjust)
//! - Reading the current state (GET /status)

use crate::api::error::ApiResult;
use crate::stream::{Device, MixWeights, StreamConfig, StreamInfo, StreamSupervisor};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    pub stream_key: String,
    #[serde(default)]
    pub mic_device: Option<String>,
    #[serde(default)]
    pub system_device: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdjustRequest {
    pub mic_weight: f64,
    pub system_weight: f64,
}

/// Creates the stream router with all stream-control endpoints.
pub fn router(supervisor: Arc<StreamSupervisor>) -> Router {
    Router::new()
        .route("/start", post(start_stream))
        .route("/stop", post(stop_stream))
        .route("/adjust", post(adjust_mix))
        .route("/status", get(stream_status))
        .with_state(supervisor)
}

async fn start_stream(
    State(supervisor): State<Arc<StreamSupervisor>>,
    Json(req): Json<StartRequest>,
) -> ApiResult<Json<StreamInfo>> {
    let config = StreamConfig::new(req.stream_key)
        .with_mic(req.mic_device.map(Device::from))
        .with_system(req.system_device.map(Device::from));

    info!(
        "Start requested via API with {} audio source(s)",
        config.audio_source_count()
    );
    let info = supervisor.start(config).await?;
    Ok(Json(info))
}

async fn stop_stream(State(supervisor): State<Arc<StreamSupervisor>>) -> ApiResult<Json<Value>> {
    info!("Stop requested via API");
    supervisor.stop().await?;
    Ok(Json(json!({
        "success": true,
        "phase": supervisor.phase().await.as_str(),
    })))
}

async fn adjust_mix(
    State(supervisor): State<Arc<StreamSupervisor>>,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<Value>> {
    let weights = MixWeights::new(req.mic_weight, req.system_weight)?;
    supervisor.adjust(weights).await?;
    Ok(Json(json!({ "success": true, "weights": weights })))
}

async fn stream_status(State(supervisor): State<Arc<StreamSupervisor>>) -> Json<Value> {
    let phase = supervisor.phase().await;
    let info = supervisor.info().await;
    let uptime = info.as_ref().map(StreamInfo::uptime_seconds);

    Json(json!({
        "phase": phase.as_str(),
        "stream": info,
        "uptime_seconds": uptime,
    }))
}
