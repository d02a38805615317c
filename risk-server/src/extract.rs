//! Request extractors

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde_json::Value;

use risk_core::PatientRecord;

use crate::error::AppError;
use crate::models::PredictRequest;

/// A fully validated patient record taken from a JSON body
#[derive(Debug, Clone, Copy)]
pub struct PatientPayload(pub PatientRecord);

#[axum::async_trait]
impl<S> FromRequest<S> for PatientPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state).await?;
        PredictRequest::parse(body).map(Self)
    }
}
