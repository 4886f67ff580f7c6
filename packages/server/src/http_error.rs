//! HTTP error handling
//!
//! Every failed request answers with a JSON body `{ message, code, details? }`.
//! The status code is derived from `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use trainingtree_core::TreeServiceError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" | "TRAINING_NOT_FOUND" | "ROOT_NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_REQUEST" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self.message, self.code);
        }
        (status, Json(self)).into_response()
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        let message = err.to_string();
        match err {
            TreeServiceError::NodeNotFound { .. } => HttpError::new(message, "NODE_NOT_FOUND"),
            TreeServiceError::TrainingNotFound { .. } => {
                HttpError::new(message, "TRAINING_NOT_FOUND")
            }
            TreeServiceError::RootNotFound { .. } => HttpError::new(message, "ROOT_NOT_FOUND"),
            TreeServiceError::InvalidRequest(_) => HttpError::new(message, "INVALID_REQUEST"),
            TreeServiceError::InconsistentState { .. } => {
                HttpError::new(message, "INCONSISTENT_STATE")
            }
            TreeServiceError::StorageFailure { step, source } => HttpError::with_details(
                message,
                "STORAGE_FAILURE",
                format!("step: {}, cause: {:?}", step, source),
            ),
            TreeServiceError::DepthLimitExceeded { .. } => {
                HttpError::new(message, "DEPTH_LIMIT_EXCEEDED")
            }
            TreeServiceError::InvalidConfig(_) => HttpError::new(message, "INVALID_CONFIG"),
        }
    }
}
