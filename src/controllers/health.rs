use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::synthesis::SynthesisService;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    match service.artifacts().check_writable().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "storage": "writable",
                "tts": service.engine_name()
            })),
        ),
        Err(e) => {
            tracing::warn!(
                error = %e,
                audio_dir = %service.artifacts().root().display(),
                "Audio directory is not writable"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "storage": "unwritable",
                    "tts": service.engine_name()
                })),
            )
        }
    }
}
