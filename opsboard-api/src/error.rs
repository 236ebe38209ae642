//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use opsboard_core::error::OpsboardError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
    }

    /// Upstream provider error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "UPSTREAM_ERROR")
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<OpsboardError> for ApiError {
    fn from(err: OpsboardError) -> Self {
        match &err {
            OpsboardError::Validation(_) => ApiError::validation(err.to_string()),
            OpsboardError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            OpsboardError::ProviderAuth { .. }
            | OpsboardError::ProviderRequest { .. }
            | OpsboardError::ProviderResponse { .. }
            | OpsboardError::ProviderTimeout { .. } => ApiError::upstream(err.to_string()),
            OpsboardError::Config(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "NOT_CONFIGURED",
            ),
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_map_to_bad_gateway() {
        let err = ApiError::from(OpsboardError::request("digitalocean", "refused"));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, "UPSTREAM_ERROR");
    }

    #[test]
    fn test_validation_maps_to_unprocessable() {
        let err = ApiError::from(OpsboardError::Validation("empty username".into()));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_user_not_found_maps_to_404() {
        let err = ApiError::from(OpsboardError::UserNotFound("u-1".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
