use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error kinds surfaced in the `type` field of error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    LimitReached,
    PremiumRequired,
    ValidationError,
    Unauthorized,
    Timeout,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        kind: Option<ErrorKind>,
    },

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    /// Server-side failure whose message is safe to show to the caller.
    #[error("{0}")]
    Internal(String),

    #[error("Bad Gateway: {message}")]
    BadGateway {
        message: String,
        details: Option<String>,
    },

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Monthly chat allowance exhausted for a new conversation.
    pub fn limit_reached() -> Self {
        AppError::Forbidden {
            message: "Chat limit reached".to_string(),
            kind: Some(ErrorKind::LimitReached),
        }
    }

    pub fn premium_required() -> Self {
        AppError::Forbidden {
            message: "Premium subscription required".to_string(),
            kind: Some(ErrorKind::PremiumRequired),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(anyhow::anyhow!(message.into()))
    }

    pub fn bad_gateway(message: impl Into<String>, details: Option<String>) -> Self {
        AppError::BadGateway {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalError(_)
            | AppError::Internal(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub success: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_message, kind, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                "Validation error".to_string(),
                Some(ErrorKind::ValidationError),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (err.to_string(), None, None, None),
            AppError::NotFound(err) => (err.to_string(), None, None, None),
            AppError::Unauthorized(err) => (
                err.to_string(),
                Some(ErrorKind::Unauthorized),
                None,
                None,
            ),
            AppError::Forbidden { message, kind } => (message, kind, None, None),
            AppError::TooManyRequests(msg, retry) => (msg, None, None, retry),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                ("Internal server error".to_string(), None, None, None)
            }
            AppError::Internal(msg) => (msg, None, None, None),
            AppError::BadGateway { message, details } => (message, None, details, None),
            AppError::ServiceUnavailable(msg) => (msg, None, None, None),
            AppError::GatewayTimeout(msg) => (msg, Some(ErrorKind::Timeout), None, None),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                ("Database error".to_string(), None, None, None)
            }
            AppError::InvalidToken(_) => (
                "Invalid token".to_string(),
                Some(ErrorKind::Unauthorized),
                None,
                None,
            ),
            AppError::ConfigError(err) => (
                "Configuration error".to_string(),
                None,
                Some(err.to_string()),
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                kind,
                details,
                success: false,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn limit_reached_carries_type() {
        let (status, body) = body_json(AppError::limit_reached()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Chat limit reached");
        assert_eq!(body["type"], "LIMIT_REACHED");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn bad_gateway_keeps_details() {
        let err = AppError::bad_gateway("AI service error: 500", Some("boom".to_string()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "AI service error: 500");
        assert_eq!(body["details"], "boom");
    }

    #[tokio::test]
    async fn internal_error_hides_its_cause() {
        let err = AppError::InternalError(anyhow::anyhow!("connection pool exhausted"));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn bad_request_has_no_type() {
        let (status, body) = body_json(AppError::bad_request("Message is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("type").is_none());
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = AppError::GatewayTimeout("slow".to_string());
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
