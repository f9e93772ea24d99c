//! Shared API types
//!
//! Error responses and the mapping from domain failures to HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::error::StoreError;
use crate::domain::DatasetError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Unprocessable { code: String, message: String },
    NotFound { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unprocessable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unprocessable {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_store(e: StoreError) -> Self {
        match e {
            StoreError::UnknownTable(table) => {
                Self::not_found("UNKNOWN_DATASET", format!("Dataset '{}' does not exist", table))
            }
            StoreError::Connectivity { .. } => {
                tracing::error!(error = %e, "Store unavailable");
                Self::service_unavailable("Database unavailable")
            }
            other => {
                tracing::error!(error = %other, "Store error");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<DatasetError> for ApiError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::Validation(v) => Self::bad_request(v.code(), v.to_string()),
            DatasetError::UnknownDataset(table) => {
                Self::not_found("UNKNOWN_DATASET", format!("Dataset '{}' does not exist", table))
            }
            DatasetError::ValueCount { .. } => Self::bad_request("VALUE_COUNT", e.to_string()),
            DatasetError::Store(StoreError::Operational(_)) => {
                Self::unprocessable("OPERATIONAL", e.message())
            }
            DatasetError::Store(store) => Self::from_store(store),
            DatasetError::Export(export) => {
                tracing::error!(error = %export, "Export failed");
                Self::internal("Export failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::Unprocessable { code, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable",
                code,
                message,
            ),
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Status for a query or count that failed after the dataset was opened.
///
/// The body of such a failure is the `success: false` response itself, so
/// only the status is chosen here.
pub fn failure_status(e: &DatasetError) -> StatusCode {
    match e {
        DatasetError::Validation(_) | DatasetError::ValueCount { .. } => StatusCode::BAD_REQUEST,
        DatasetError::Store(StoreError::Operational(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        DatasetError::Store(StoreError::UnknownTable(_)) | DatasetError::UnknownDataset(_) => {
            StatusCode::NOT_FOUND
        }
        DatasetError::Store(StoreError::Connectivity { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        DatasetError::Store(StoreError::Database(_)) | DatasetError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
