//! HTTP mapping of domain errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use medstock_ledger::LedgerError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code
    #[schema(example = "insufficient_stock")]
    pub error: String,
    pub message: String,
    /// Present and true when the same request may succeed later
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

/// Domain error carried to the HTTP boundary
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        Self(error)
    }
}

/// Malformed request bodies answer with the same JSON error shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LedgerError::validation("body", rejection.body_text()))
    }
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self(LedgerError::Unauthenticated)
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::InvalidCredentials | LedgerError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            LedgerError::Forbidden => StatusCode::FORBIDDEN,
            LedgerError::InvalidQuantity { .. } | LedgerError::Validation { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LedgerError::InsufficientStock { .. } | LedgerError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Storage { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self.0 {
            LedgerError::Storage { message, .. } => {
                error!(error = %message, "Storage failure");
                "Storage is temporarily unavailable, please retry".to_string()
            }
            LedgerError::Internal { message } => {
                error!(error = %message, "Internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message,
            retryable: self.0.is_retryable(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: LedgerError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(error).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (LedgerError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (LedgerError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (LedgerError::Forbidden, StatusCode::FORBIDDEN),
            (
                LedgerError::invalid_quantity("must be at least 1"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::InsufficientStock {
                    available: 1,
                    requested: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::validation("name", "Name is required"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LedgerError::conflict("taken"), StatusCode::CONFLICT),
            (LedgerError::not_found("Item 1"), StatusCode::NOT_FOUND),
            (
                LedgerError::storage("database is locked"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::internal("Password hashing failed"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).status(), expected);
        }
    }

    #[tokio::test]
    async fn storage_details_are_not_exposed() {
        let (status, body) = body_of(LedgerError::storage("disk I/O error at page 7")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["retryable"], true);
        assert!(!body["message"].as_str().unwrap().contains("page 7"));
    }

    #[tokio::test]
    async fn internal_errors_are_not_retryable() {
        let (status, body) = body_of(LedgerError::internal("output size too large")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert!(body.get("retryable").is_none());
        assert!(!body["message"].as_str().unwrap().contains("output size"));
    }

    #[tokio::test]
    async fn validation_errors_keep_their_reason() {
        let (status, body) = body_of(LedgerError::InsufficientStock {
            available: 3,
            requested: 4,
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "insufficient_stock");
        assert!(body["message"].as_str().unwrap().contains("3 available"));
        assert!(body.get("retryable").is_none());
    }
}
