//! Prediction handler

use axum::{extract::State, Json};

use risk_core::PredictionResult;

use crate::AppState;
use crate::extract::PatientPayload;

/// Score one patient record
pub async fn predict(
    State(state): State<AppState>,
    PatientPayload(record): PatientPayload,
) -> Json<PredictionResult> {
    let result = state.engine.predict(&record);
    tracing::debug!(
        "Scored record: probability {:.4}, prediction {}",
        result.probability,
        result.prediction
    );
    Json(result)
}
