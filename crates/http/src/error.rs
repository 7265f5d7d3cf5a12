//! Error handling for the shelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// `error.message`: a single sentence, or one entry per validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    List(Vec<String>),
}

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: ErrorMessage,
    pub status: u16,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {}", .violations.join("; "))]
    Validation { violations: Vec<String> },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation<I, S>(violations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            violations: violations.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the `{ "error": { "message", "status" } }` payload.
    pub fn into_body(self) -> ErrorBody {
        let status = self.status();

        let message = match self {
            AppError::Validation { violations } => ErrorMessage::List(violations),
            AppError::NotFound { message }
            | AppError::BadRequest { message } => ErrorMessage::Text(message),
            // In production, we hide internal error details
            AppError::Internal(_) if cfg!(not(debug_assertions)) => {
                ErrorMessage::Text("An internal server error occurred".to_string())
            }
            AppError::Internal(e) => ErrorMessage::Text(format!("{:#}", e)),
        };

        ErrorBody {
            message,
            status: status.as_u16(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::info!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let body = ErrorEnvelope {
            error: self.into_body(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_violations() {
        let error = AppError::validation(["instance requires property \"year\""]);
        let (status, body) = body_json(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({
                "error": {
                    "message": ["instance requires property \"year\""],
                    "status": 400
                }
            })
        );
    }

    #[tokio::test]
    async fn test_not_found_message_is_a_string() {
        let (status, body) = body_json(AppError::not_found("Resource not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Resource not found");
        assert_eq!(body["error"]["status"], 404);
    }

    #[tokio::test]
    async fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let (status, body) = body_json(AppError::Internal(internal_error)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["status"], 500);
        assert!(body["error"]["message"].is_string());
    }

    #[test]
    fn test_display_joins_violations() {
        let error = AppError::validation(["a", "b"]);
        assert_eq!(error.to_string(), "validation error: a; b");
    }
}
