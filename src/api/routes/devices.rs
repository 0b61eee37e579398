//! Device listing API routes.

use crate::api::error::ApiResult;
use crate::devices::DeviceEnumerator;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Create the devices router.
pub fn router(enumerator: Arc<dyn DeviceEnumerator>) -> Router {
    Router::new()
        .route("/", get(list_devices))
        .with_state(enumerator)
}

/// GET /devices - List audio capture devices. An empty list is not an error.
async fn list_devices(State(enumerator): State<Arc<dyn DeviceEnumerator>>) -> ApiResult<Json<Value>> {
    let devices = enumerator.list_input_devices().await?;
    Ok(Json(json!({ "devices": devices })))
}
