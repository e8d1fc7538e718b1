//! Mapping of gateway and auth failures into HTTP responses

use crate::auth::AuthError;
use crate::body::BodyError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sms_gateway::GatewayError;

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    /// Missing, expired or invalid bearer token
    Unauthorized(String),
    /// Wrong or missing API key
    Forbidden,
    /// Malformed request
    BadRequest(String),
    /// Device or storage failure
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidApiKey => ApiError::Forbidden,
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<BodyError> for ApiError {
    fn from(err: BodyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forbidden => {
                return (StatusCode::FORBIDDEN, AuthError::InvalidApiKey.to_string()).into_response()
            }
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
