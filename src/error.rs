use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// A single rejected field in a search or lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("invalid business id")]
    InvalidBusinessId,

    #[error("no route matches the request path")]
    NotFound,

    #[error("method not allowed on this route")]
    MethodNotAllowed,

    #[error("client rate limit exceeded")]
    RateLimited,

    #[error("upstream provider rate limited the request")]
    UpstreamRateLimited,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("rate limit store error: {0}")]
    Store(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl AppError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidBusinessId => "invalid_business_id",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::RateLimited => "rate_limited",
            Self::UpstreamRateLimited => "upstream_rate_limited",
            Self::Config(_) => "config_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Transport(_) => "transport_error",
            Self::Timeout => "timeout",
            Self::Store(_) => "store_error",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBusinessId => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited | Self::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Config(_)
            | Self::Upstream { .. }
            | Self::Transport(_)
            | Self::Timeout
            | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Never carries internal detail.
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid request data",
            Self::InvalidBusinessId => "Invalid business ID",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::RateLimited => "Too many requests. Please try again later.",
            Self::UpstreamRateLimited => "Service temporarily unavailable. Please try again later.",
            Self::Config(_) => "Service configuration error",
            Self::Timeout => "Search request timed out. Please try again.",
            Self::Upstream { .. } | Self::Transport(_) | Self::Store(_) => {
                "Search failed. Please try again."
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error_type = self.error_type(), error = %self, "request failed");
        } else {
            tracing::debug!(error_type = self.error_type(), error = %self, "request rejected");
        }

        let error = self.client_message();
        let details = match self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
