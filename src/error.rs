use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Upstream rejected credential: {0}")]
    Auth(String),

    #[error("Upstream quota exhausted: {0}")]
    Quota(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),
}

impl GatewayError {
    /// True for failures caused by the completion API rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            GatewayError::Auth(_)
                | GatewayError::Quota(_)
                | GatewayError::Upstream { .. }
                | GatewayError::UnexpectedResponse(_)
        )
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            GatewayError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            GatewayError::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
            GatewayError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again in a few minutes.".to_string(),
                Some(retry_after),
            ),
            GatewayError::Auth(ref msg) => {
                tracing::error!("Upstream rejected API key: {}", msg);
                (StatusCode::UNAUTHORIZED, "Invalid API key".to_string(), None)
            }
            GatewayError::Quota(ref msg) => {
                tracing::error!("Upstream quota exhausted: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, "Quota exceeded".to_string(), None)
            }
            GatewayError::Upstream { status, message } => {
                tracing::error!("Upstream error ({}): {}", status, message);
                (upstream_status(status), message, None)
            }
            GatewayError::UnexpectedResponse(ref msg) => {
                tracing::error!("Unexpected upstream response: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected response format from OpenAI".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorBody {
            error: message,
            retry_after,
        });
        let mut response = (status, body).into_response();

        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

// Only error statuses are echoed back, anything else becomes 500
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub type Result<T> = std::result::Result<T, GatewayError>;
