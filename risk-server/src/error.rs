//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(Vec<FieldError>),
    MalformedBody(String),
    UnsupportedMediaType,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::ValidationError(fields) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string(), Some(fields))
            }
            AppError::MalformedBody(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`".to_string(),
                None,
            ),
        };

        let body = match fields {
            Some(fields) => json!({
                "error": error_message,
                "status": status.as_u16(),
                "fields": fields,
            }),
            None => json!({
                "error": error_message,
                "status": status.as_u16()
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let name = crate::models::wire_name(&field);
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(name, message)
                })
            })
            .collect();
        fields.sort_by_key(|f| risk_core::schema::feature_index(&f.field));
        AppError::ValidationError(fields)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType,
            JsonRejection::JsonDataError(e) => {
                AppError::ValidationError(vec![FieldError::new("body", e.body_text())])
            }
            other => AppError::MalformedBody(other.body_text()),
        }
    }
}
