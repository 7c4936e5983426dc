//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether the OCR engine can be invoked
    pub ocr_available: bool,
    /// Configured structured extractor, if any
    pub structured_provider: Option<&'static str>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let recognizer = state.extraction().recognizer();
    let ocr_available = tokio::task::spawn_blocking(move || recognizer.is_available())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: if ocr_available { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        ocr_available,
        structured_provider: state.extraction().extractor_name(),
    })
}
